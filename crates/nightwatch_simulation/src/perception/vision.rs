//! Vision Sensor — периодический скан конуса зрения с occlusion-фильтром
//!
//! Poll-based, на собственном медленном интервале (дешевле кадрового тика):
//! результат кешируется в VisibleSet до следующего скана. Гарантируется
//! только членство в множестве, не порядок обхода.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::components::Actor;
use crate::services::{OcclusionService, RayHit};

/// Высота глаз над опорной точкой агента (метры)
pub const EYE_HEIGHT: f32 = 1.7;

/// Конус зрения агента + cadence скана
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct VisionCone {
    /// Радиус обнаружения (метры)
    pub radius: f32,
    /// Половина угла раствора конуса (радианы), от forward-оси
    pub half_angle: f32,
    /// Интервал между сканами (сек)
    pub interval: f32,
    pub timer: f32,
}

impl Default for VisionCone {
    fn default() -> Self {
        Self {
            radius: 20.0,
            half_angle: 1.0, // ~57°
            interval: 0.1,
            timer: 0.0,
        }
    }
}

/// Кеш видимых целей: entity → позиция, снятая в момент скана
#[derive(Component, Debug, Clone, Default)]
pub struct VisibleSet {
    pub seen: HashMap<Entity, Vec3>,
}

/// Память последних наблюдавшихся позиций (для детекции движения)
///
/// Записи выбрасываются, когда цель покидает видимое множество; свежая
/// запись без предыдущей не считается движущейся.
#[derive(Component, Debug, Clone, Default)]
pub struct LastKnownPositions {
    pub positions: HashMap<Entity, Vec3>,
}

/// Чистая проверка конуса: цель в радиусе и внутри угла
pub fn in_cone(origin: Vec3, forward: Vec3, radius: f32, half_angle: f32, point: Vec3) -> bool {
    let to_target = point - origin;
    let distance_sq = to_target.length_squared();
    if distance_sq > radius * radius {
        return false;
    }
    if distance_sq < 1e-6 {
        // Цель вплотную — угол вырожден, считаем видимой
        return true;
    }
    forward.angle_between(to_target) <= half_angle
}

/// Система: обновление VisibleSet по cadence конуса
///
/// Фильтры: чужая фракция → радиус+угол → occlusion-луч от глаз.
/// Луч, упёршийся в саму цель — это контакт, не преграда.
pub fn refresh_vision(
    mut observers: Query<(Entity, &Transform, &Actor, &mut VisionCone, &mut VisibleSet)>,
    targets: Query<(Entity, &Transform, &Actor)>,
    occlusion: Res<OcclusionService>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    for (observer, transform, actor, mut cone, mut visible) in observers.iter_mut() {
        cone.timer += dt;
        if cone.timer < cone.interval - 1e-4 {
            continue;
        }
        cone.timer = 0.0;

        let eye = transform.translation + Vec3::Y * EYE_HEIGHT;
        let forward = *transform.forward();
        let mut seen = HashMap::new();

        for (target, target_transform, target_actor) in targets.iter() {
            if target == observer || target_actor.faction_id == actor.faction_id {
                continue;
            }
            if !in_cone(
                transform.translation,
                forward,
                cone.radius,
                cone.half_angle,
                target_transform.translation,
            ) {
                continue;
            }

            let target_point = target_transform.translation + Vec3::Y * EYE_HEIGHT;
            match occlusion.0.cast(eye, target_point) {
                RayHit::Clear => {}
                RayHit::Actor(hit) if hit == target => {}
                _ => continue,
            }

            seen.insert(target, target_transform.translation);
        }

        visible.seen = seen;
    }
}

/// Детекция движущихся целей: сравнение снятой позиции с памятью
///
/// speed = distance / Δt, Δt = decision interval. Первое наблюдение цели
/// только записывается. Память чистится от покинувших видимое множество.
/// Результат отсортирован по Entity для детерминизма.
pub fn collect_moving_targets(
    visible: &VisibleSet,
    memory: &mut LastKnownPositions,
    dt: f32,
    threshold: f32,
) -> Vec<(Entity, Vec3)> {
    let mut moving = Vec::new();

    for (&entity, &position) in visible.seen.iter() {
        if let Some(&previous) = memory.positions.get(&entity) {
            let speed = previous.distance(position) / dt;
            if speed > threshold {
                moving.push((entity, position));
            }
        }
        memory.positions.insert(entity, position);
    }

    memory
        .positions
        .retain(|entity, _| visible.seen.contains_key(entity));

    moving.sort_by_key(|(entity, _)| entity.index());
    moving
}
