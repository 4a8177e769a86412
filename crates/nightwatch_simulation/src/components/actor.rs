//! Базовые сущности мира: Actor, Sentry

use bevy::prelude::*;

/// Актор — базовый компонент для любой воспринимаемой сущности
/// (часовой, нарушитель, одержимый игроком объект)
///
/// Зрение фильтрует цели по faction_id: своих не высматриваем.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct Actor {
    /// Stable ID фракции (часовые охотятся на чужие фракции)
    pub faction_id: u64,
}

/// Sentry — маркер AI-агента (часового)
///
/// Автоматически добавляет весь AI-комплект через Required Components:
/// состояние FSM, alert, конфиг, перцепцию, патруль и навигационный handle.
/// Достаточно `spawn((Transform::..., Actor { faction_id }, Sentry))`.
#[derive(Component, Debug, Clone, Default)]
#[require(
    Actor,
    Transform,
    crate::ai::AIState,
    crate::components::Alert,
    crate::components::AgentConfig,
    crate::components::DecisionClock,
    crate::components::PatrolRoute,
    crate::components::MovementCommand,
    crate::perception::VisionCone,
    crate::perception::VisibleSet,
    crate::perception::LastKnownPositions,
    crate::navigation::NavAgent
)]
pub struct Sentry;
