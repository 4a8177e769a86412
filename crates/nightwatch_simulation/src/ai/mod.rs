//! AI decision-making module
//!
//! FSM часового (Searching/Investigating/Alerted) + Alert Engine +
//! capture sequence. Перцепция — в crate::perception, исполнение движения —
//! в crate::navigation.

use bevy::prelude::*;

pub mod alert;
pub mod capture;
pub mod events;
pub mod fsm;

// Re-export основных типов
pub use capture::CaptureState;
pub use events::{AnimationCue, CueKind, NoiseEvent, NoiseHeard, TargetCaptured};
pub use fsm::AIState;

use crate::SimulationSet;

/// AI Plugin
///
/// Регистрирует decision/capture системы в FixedUpdate.
/// Порядок выполнения:
/// 1. agent_decision — FSM transitions + Alert Engine (на decision clock)
/// 2. sync_movement — состояние → MovementCommand
/// 3. abort_stale_captures / process_capture_cues / align_held_targets
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AnimationCue>()
            .add_event::<TargetCaptured>()
            .init_resource::<crate::services::AnimationSinkService>()
            .init_resource::<crate::services::PossessionService>()
            .init_resource::<crate::services::PhysicsProxyService>()
            .add_systems(
                FixedUpdate,
                (fsm::agent_decision, fsm::sync_movement)
                    .chain()
                    .in_set(SimulationSet::Decision),
            )
            .add_systems(
                FixedUpdate,
                (
                    capture::abort_stale_captures,
                    capture::process_capture_cues,
                    capture::align_held_targets,
                )
                    .chain()
                    .in_set(SimulationSet::Capture),
            );
    }
}
