//! Capture Sequence — grab/carry/release по дискретным cues анимации
//!
//! Двухфазный суб-автомат: Reaching → (Grab cue) → Holding → (Release cue)
//! → снят. Собственного таймера нет — последовательность целиком ведут два
//! внешних cue от анимационной системы (AnimationCue events). Отсутствие
//! компонента CaptureState == Released.

use bevy::prelude::*;

use crate::ai::{AnimationCue, CueKind, TargetCaptured};
use crate::components::{Actor, MovementCommand, Sentry};
use crate::navigation::NavAgent;
use crate::services::{PhysicsProxyService, PossessionService};

/// Точка переноски относительно агента: чуть вперёд и над плечом
pub const CARRY_FORWARD: f32 = 0.6;
pub const CARRY_HEIGHT: f32 = 1.1;

/// Активная фаза capture sequence
#[derive(Component, Debug, Clone, PartialEq)]
pub enum CaptureState {
    /// Проигрывается pickup-анимация, ждём Grab cue
    Reaching { target: Entity },
    /// Цель у нас: possession передан, физика цели выключена
    Holding { target: Entity },
}

impl CaptureState {
    pub fn target(&self) -> Entity {
        match self {
            CaptureState::Reaching { target } | CaptureState::Holding { target } => *target,
        }
    }
}

/// Система: обработка Grab/Release cues от анимационного слоя
pub fn process_capture_cues(
    mut commands: Commands,
    mut cues: EventReader<AnimationCue>,
    mut agents: Query<(&mut CaptureState, &mut NavAgent, &mut MovementCommand)>,
    targets: Query<(), With<Actor>>,
    possession: Res<PossessionService>,
    physics: Res<PhysicsProxyService>,
    mut captured: EventWriter<TargetCaptured>,
) {
    for cue in cues.read() {
        // Cue агенту вне capture sequence — игнорируем
        let Ok((mut capture, mut nav, mut command)) = agents.get_mut(cue.agent) else {
            continue;
        };

        match (cue.cue, capture.clone()) {
            (CueKind::Grab, CaptureState::Reaching { target }) => {
                if targets.get(target).is_err() {
                    // Цель исчезла пока рука тянулась — отменяем захват
                    crate::logger::log_warning(&format!(
                        "🫳 {:?} capture aborted: target {:?} is gone",
                        cue.agent, target
                    ));
                    release_agent(&mut commands, cue.agent, &mut nav, &mut command);
                    continue;
                }

                // Логическое владение: забираем у прежнего владельца,
                // глушим независимую симуляцию на время переноски
                possession.0.release_from_current_owner(target);
                physics.0.set_simulation_enabled(target, false);
                *capture = CaptureState::Holding { target };
                crate::logger::log(&format!("🤲 {:?} holding {:?}", cue.agent, target));
            }

            (CueKind::Release, CaptureState::Holding { target }) => {
                physics.0.set_simulation_enabled(target, true);
                release_agent(&mut commands, cue.agent, &mut nav, &mut command);
                captured.write(TargetCaptured {
                    agent: cue.agent,
                    target,
                });
                crate::logger::log(&format!("✅ {:?} capture complete on {:?}", cue.agent, target));
            }

            (CueKind::Release, CaptureState::Reaching { .. }) => {
                // Принудительный сброс до grab — владение не передавалось
                release_agent(&mut commands, cue.agent, &mut nav, &mut command);
            }

            (CueKind::Grab, CaptureState::Holding { .. }) => {
                // Повторный grab cue — игнор
            }
        }
    }
}

/// Система: цель capture sequence исчезла без cue — не виснем в ожидании
pub fn abort_stale_captures(
    mut commands: Commands,
    mut agents: Query<(Entity, &CaptureState, &mut NavAgent, &mut MovementCommand)>,
    targets: Query<(), With<Actor>>,
    physics: Res<PhysicsProxyService>,
) {
    for (agent, capture, mut nav, mut command) in agents.iter_mut() {
        let target = capture.target();
        if targets.get(target).is_ok() {
            continue;
        }

        if matches!(capture, CaptureState::Holding { .. }) {
            physics.0.set_simulation_enabled(target, true);
        }
        crate::logger::log_warning(&format!(
            "🫳 {:?} capture aborted: held target {:?} destroyed",
            agent, target
        ));
        release_agent(&mut commands, agent, &mut nav, &mut command);
    }
}

/// Система: выравнивание переносимой цели к carry point (каждый тик)
///
/// Жёсткий offset пересчитывается заново каждый кадр, не кешируется.
pub fn align_held_targets(
    agents: Query<(&Transform, &CaptureState), With<Sentry>>,
    mut held: Query<&mut Transform, Without<Sentry>>,
) {
    for (transform, capture) in agents.iter() {
        let CaptureState::Holding { target } = *capture else {
            continue;
        };
        let Ok(mut target_transform) = held.get_mut(target) else {
            continue; // abort_stale_captures подчистит
        };

        target_transform.translation = transform.translation
            + *transform.forward() * CARRY_FORWARD
            + Vec3::Y * CARRY_HEIGHT;
        target_transform.rotation = transform.rotation;
    }
}

fn release_agent(
    commands: &mut Commands,
    agent: Entity,
    nav: &mut NavAgent,
    command: &mut MovementCommand,
) {
    commands.entity(agent).remove::<CaptureState>();
    nav.set_stopped(false);
    *command = MovementCommand::Idle;
}
