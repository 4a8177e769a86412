//! Navigation — path-following handle и headless-драйвер движения
//!
//! NavAgent — клиентский контракт path-following сервиса (destination,
//! remaining distance, stopping distance, speed, halt). В боевой сборке его
//! ведёт тактический слой; здесь drive_nav_agents — headless-заменитель,
//! двигающий Transform по прямой. AI-ядру без разницы, кто исполняет.

use bevy::prelude::*;

use crate::components::{Actor, MovementCommand};
use crate::services::AnimationSinkService;
use crate::SimulationSet;

/// Верх нормировки скорости для анимационного параметра
const MAX_LOCOMOTION_SPEED: f32 = 6.0;

/// Path-following handle агента
#[derive(Component, Debug, Clone)]
pub struct NavAgent {
    destination: Option<Vec3>,
    speed: f32,
    /// Дистанция, на которой останавливаемся перед destination
    pub stopping_distance: f32,
    stopped: bool,
    path_pending: bool,
    remaining: f32,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            destination: None,
            speed: 2.0,
            stopping_distance: 0.6,
            stopped: false,
            path_pending: false,
            remaining: f32::INFINITY,
        }
    }
}

impl NavAgent {
    pub fn set_destination(&mut self, point: Vec3) {
        if self.destination != Some(point) {
            self.path_pending = true;
        }
        self.destination = Some(point);
    }

    pub fn clear_destination(&mut self) {
        self.destination = None;
        self.path_pending = false;
        self.remaining = f32::INFINITY;
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// true пока путь к свежему destination ещё не посчитан
    pub fn is_path_pending(&self) -> bool {
        self.path_pending
    }

    /// Остаток пути; INFINITY без destination
    pub fn remaining_distance(&self) -> f32 {
        self.remaining
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_stopped(&mut self, stopped: bool) {
        self.stopped = stopped;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Система: MovementCommand → NavAgent destination
///
/// Follow обновляет destination каждый кадр (цель двигается!) — живое
/// преследование между decision tick'ами.
pub fn apply_movement_commands(
    mut agents: Query<(&MovementCommand, &mut NavAgent)>,
    targets: Query<&Transform, With<Actor>>,
) {
    for (command, mut nav) in agents.iter_mut() {
        match command {
            MovementCommand::Idle => {
                if nav.destination.is_some() {
                    nav.clear_destination();
                }
            }

            MovementCommand::MoveTo { target } => {
                nav.set_destination(*target);
                nav.stopped = false;
            }

            MovementCommand::Follow { target } => {
                // Цель исчезла — остаёмся на последнем destination
                if let Ok(target_transform) = targets.get(*target) {
                    nav.set_destination(target_transform.translation);
                }
                nav.stopped = false;
            }

            MovementCommand::Stop => {
                nav.stopped = true;
                nav.clear_destination();
            }
        }
    }
}

/// Система: headless-драйвер — прямолинейный ход к destination
///
/// Поворот по ходу движения (yaw only); нормированная скорость уходит
/// в анимационный sink каждый кадр.
pub fn drive_nav_agents(
    mut agents: Query<(Entity, &mut Transform, &mut NavAgent)>,
    anim: Res<AnimationSinkService>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    for (entity, mut transform, mut nav) in agents.iter_mut() {
        // Путь "посчитан" к этому кадру
        nav.path_pending = false;

        let Some(destination) = nav.destination else {
            anim.0.set_speed_parameter(entity, 0.0);
            continue;
        };

        let to_target = destination - transform.translation;
        let distance = to_target.length();
        nav.remaining = distance;

        if nav.stopped || distance <= nav.stopping_distance {
            anim.0.set_speed_parameter(entity, 0.0);
            continue;
        }

        let step = (nav.speed * dt).min(distance);
        let direction = to_target / distance;
        transform.translation += direction * step;
        nav.remaining = distance - step;

        let flat = Vec3::new(direction.x, 0.0, direction.z);
        if flat.length_squared() > 1e-6 {
            transform.look_to(flat, Vec3::Y);
        }

        anim.0
            .set_speed_parameter(entity, (nav.speed / MAX_LOCOMOTION_SPEED).clamp(0.0, 1.0));
    }
}

/// Navigation Plugin: команды → destination → движение, каждый кадр
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnimationSinkService>().add_systems(
            FixedUpdate,
            (apply_movement_commands, drive_nav_agents)
                .chain()
                .in_set(SimulationSet::Movement),
        );
    }
}
