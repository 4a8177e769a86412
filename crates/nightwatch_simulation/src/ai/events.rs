//! AI Events — шумы, UI-нотификации и cues от анимационного слоя
//!
//! Внешние коллабораторы общаются с ядром событиями: звук → NoiseEvent,
//! анимационная система → AnimationCue, ядро наружу → NoiseHeard /
//! TargetCaptured.

use bevy::prelude::*;

/// Шум в мире: позиция, радиус распространения, исходная интенсивность
///
/// Не хранится: синхронно потребляется каждым зарегистрированным агентом
/// в момент broadcast'а.
#[derive(Event, Debug, Clone)]
pub struct NoiseEvent {
    pub position: Vec3,
    pub range: f32,
    pub intensity: f32,
}

/// Fire-and-forget нотификация "агент услышал шум" (для UI-иконок)
#[derive(Event, Debug, Clone)]
pub struct NoiseHeard {
    pub agent: Entity,
    pub intensity: f32,
}

/// Дискретные cues от анимационной системы в capture sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    /// Mid-sequence: рука дотянулась, забираем цель
    Grab,
    /// Конец последовательности (или принудительный сброс извне)
    Release,
}

#[derive(Event, Debug, Clone)]
pub struct AnimationCue {
    pub agent: Entity,
    pub cue: CueKind,
}

/// Захват завершён: possession/счёт снаружи решают судьбу цели
#[derive(Event, Debug, Clone)]
pub struct TargetCaptured {
    pub agent: Entity,
    pub target: Entity,
}
