//! Perception: зрение (конус + occlusion) и слух (broadcast шумов)

use bevy::prelude::*;

pub mod hearing;
pub mod vision;

// Re-export основных типов
pub use hearing::EAR_HEIGHT;
pub use vision::{collect_moving_targets, LastKnownPositions, VisibleSet, VisionCone, EYE_HEIGHT};

use crate::ai::{NoiseEvent, NoiseHeard};
use crate::SimulationSet;

/// Perception Plugin
///
/// Порядок внутри тика: сначала свежий снимок зрения, потом доставка шумов —
/// решения AI в SimulationSet::Decision читают уже обновлённую перцепцию.
pub struct PerceptionPlugin;

impl Plugin for PerceptionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<NoiseEvent>()
            .add_event::<NoiseHeard>()
            .init_resource::<crate::services::OcclusionService>()
            .init_resource::<crate::services::NavMeshService>()
            .add_systems(
                FixedUpdate,
                (vision::refresh_vision, hearing::deliver_noise_events)
                    .chain()
                    .in_set(SimulationSet::Perception),
            );
    }
}
