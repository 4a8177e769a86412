//! Внешние коллабораторы ядра: occlusion, navmesh, анимации, possession
//!
//! Тактический слой (Godot/физика/анимации) подключается через trait objects
//! в Resource-обёртках — ядро тестируется без живого движка, моки просто
//! подменяют ресурс. У каждого сервиса есть null/identity default, так что
//! отсутствующий коллаборатор деградирует, а не роняет симуляцию.

use bevy::prelude::*;
use std::sync::{Arc, Mutex};

/// Результат occlusion-луча
///
/// Actor-вариант позволяет отличить "луч упёрся в саму преследуемую цель"
/// (это контакт, не преграда) от "перекрыт декорацией".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayHit {
    Clear,
    Scenery,
    Actor(Entity),
}

/// Line-of-sight тест тактического слоя
pub trait Occlusion: Send + Sync {
    fn cast(&self, from: Vec3, to: Vec3) -> RayHit;

    fn line_clear(&self, from: Vec3, to: Vec3) -> bool {
        matches!(self.cast(from, to), RayHit::Clear)
    }
}

#[derive(Resource)]
pub struct OcclusionService(pub Box<dyn Occlusion>);

impl Default for OcclusionService {
    fn default() -> Self {
        Self(Box::new(OpenWorld))
    }
}

/// Мир без преград (default)
pub struct OpenWorld;

impl Occlusion for OpenWorld {
    fn cast(&self, _from: Vec3, _to: Vec3) -> RayHit {
        RayHit::Clear
    }
}

/// Статический набор AABB-стен — headless-заменитель raycast'а движка
///
/// Сегмент против AABB slab-методом. Хватает для тестов и демо.
#[derive(Default)]
pub struct StaticColliders {
    pub walls: Vec<(Vec3, Vec3)>, // (min, max)
}

impl StaticColliders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wall(mut self, min: Vec3, max: Vec3) -> Self {
        self.walls.push((min, max));
        self
    }

    /// Slab-метод: пересекает ли отрезок from→to бокс [min, max]
    fn segment_hits_aabb(from: Vec3, to: Vec3, min: Vec3, max: Vec3) -> bool {
        let dir = to - from;
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;

        for axis in 0..3 {
            let origin = from[axis];
            let delta = dir[axis];
            let lo = min[axis];
            let hi = max[axis];

            if delta.abs() < 1e-6 {
                // Параллельно слэбу: мимо, если origin вне
                if origin < lo || origin > hi {
                    return false;
                }
            } else {
                let inv = 1.0 / delta;
                let mut t0 = (lo - origin) * inv;
                let mut t1 = (hi - origin) * inv;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return false;
                }
            }
        }
        true
    }
}

impl Occlusion for StaticColliders {
    fn cast(&self, from: Vec3, to: Vec3) -> RayHit {
        for &(min, max) in &self.walls {
            if Self::segment_hits_aabb(from, to, min, max) {
                return RayHit::Scenery;
            }
        }
        RayHit::Clear
    }
}

/// Снап точки на проходимую поверхность (контракт navmesh-сервиса)
pub trait NavMesh: Send + Sync {
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3>;
}

#[derive(Resource)]
pub struct NavMeshService(pub Box<dyn NavMesh>);

impl Default for NavMeshService {
    fn default() -> Self {
        Self(Box::new(OpenPlane))
    }
}

/// Бесконечная проходимая плоскость y=0 (default): проекция вниз
pub struct OpenPlane;

impl NavMesh for OpenPlane {
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        if point.y.abs() > max_distance {
            return None;
        }
        Some(Vec3::new(point.x, 0.0, point.z))
    }
}

/// Анимационный sink тактического слоя
///
/// Ядро только пишет параметры/триггеры; дискретные cues ("grab", "release")
/// приходят обратно событиями AnimationCue.
pub trait AnimationSink: Send + Sync {
    fn set_speed_parameter(&self, entity: Entity, normalized_speed: f32);
    fn set_bool_parameter(&self, entity: Entity, name: &str, value: bool);
    fn trigger_transition(&self, entity: Entity, name: &str);
}

#[derive(Resource)]
pub struct AnimationSinkService(pub Box<dyn AnimationSink>);

impl Default for AnimationSinkService {
    fn default() -> Self {
        Self(Box::new(NullAnimationSink))
    }
}

pub struct NullAnimationSink;

impl AnimationSink for NullAnimationSink {
    fn set_speed_parameter(&self, _entity: Entity, _normalized_speed: f32) {}
    fn set_bool_parameter(&self, _entity: Entity, _name: &str, _value: bool) {}
    fn trigger_transition(&self, _entity: Entity, _name: &str) {}
}

/// Записывающий sink для тестов: shared handle на список вызовов
///
/// set_speed_parameter не пишем — он дёргается каждый кадр и зашумляет лог.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl AnimationSink for RecordingSink {
    fn set_speed_parameter(&self, _entity: Entity, _normalized_speed: f32) {}

    fn set_bool_parameter(&self, entity: Entity, name: &str, value: bool) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{entity:?} set {name}={value}"));
    }

    fn trigger_transition(&self, entity: Entity, name: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{entity:?} trigger {name}"));
    }
}

/// Possession manager: забрать цель у текущего владельца на grab cue
pub trait PossessionManager: Send + Sync {
    fn release_from_current_owner(&self, actor: Entity);
}

#[derive(Resource)]
pub struct PossessionService(pub Box<dyn PossessionManager>);

impl Default for PossessionService {
    fn default() -> Self {
        Self(Box::new(NullPossession))
    }
}

pub struct NullPossession;

impl PossessionManager for NullPossession {
    fn release_from_current_owner(&self, _actor: Entity) {}
}

#[derive(Clone, Default)]
pub struct RecordingPossession {
    pub released: Arc<Mutex<Vec<Entity>>>,
}

impl PossessionManager for RecordingPossession {
    fn release_from_current_owner(&self, actor: Entity) {
        self.released.lock().unwrap().push(actor);
    }
}

/// Вкл/выкл независимой физической симуляции цели (на время переноски)
pub trait PhysicsProxy: Send + Sync {
    fn set_simulation_enabled(&self, actor: Entity, enabled: bool);
}

#[derive(Resource)]
pub struct PhysicsProxyService(pub Box<dyn PhysicsProxy>);

impl Default for PhysicsProxyService {
    fn default() -> Self {
        Self(Box::new(NullPhysics))
    }
}

pub struct NullPhysics;

impl PhysicsProxy for NullPhysics {
    fn set_simulation_enabled(&self, _actor: Entity, _enabled: bool) {}
}

#[derive(Clone, Default)]
pub struct RecordingPhysics {
    pub toggles: Arc<Mutex<Vec<(Entity, bool)>>>,
}

impl PhysicsProxy for RecordingPhysics {
    fn set_simulation_enabled(&self, actor: Entity, enabled: bool) {
        self.toggles.lock().unwrap().push((actor, enabled));
    }
}
