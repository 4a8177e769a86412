//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые сущности мира (Actor, Sentry)
//! - agent: состояние подозрения и тюнинг AI (Alert, AgentConfig, PatrolRoute, DecisionClock)
//! - movement: команды перемещения для тактического слоя (MovementCommand)
//!
//! Perception-компоненты (VisionCone, VisibleSet, LastKnownPositions) живут
//! в crate::perception рядом со своими системами.

pub mod actor;
pub mod agent;
pub mod movement;

// Re-exports для удобного импорта
pub use actor::*;
pub use agent::*;
pub use movement::*;
