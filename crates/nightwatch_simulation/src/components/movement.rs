//! Movement команды: high-level intent для path-following сервиса

use bevy::prelude::*;

/// Команда движения для агента (исполняется path-following сервисом)
///
/// Архитектура:
/// - AI система пишет MovementCommand (high-level intent)
/// - apply_movement_commands конвертирует в NavAgent destination
/// - drive_nav_agents (или внешний тактический слой) применяет движение
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum MovementCommand {
    /// Стоять на месте (сбросить destination)
    Idle,
    /// Двигаться к позиции (world coordinates)
    MoveTo { target: Vec3 },
    /// Преследовать entity (destination обновляется каждый кадр)
    Follow { target: Entity },
    /// Остановиться немедленно (halt + сброс destination)
    Stop,
}

impl Default for MovementCommand {
    fn default() -> Self {
        Self::Idle
    }
}
