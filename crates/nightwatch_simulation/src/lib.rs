//! NIGHTWATCH Simulation Core
//!
//! ECS-ядро перцепции и преследования для stealth-игры (strategic layer).
//! Каждый тик решаем: агент ничего не подозревает, насторожен или активно
//! охотится — на основе зрения (конус + occlusion) и слуха (шумы с
//! затуханием), и ведём навигацию + capture sequence.
//!
//! HYBRID ARCHITECTURE:
//! - ECS = strategic layer (alert state, FSM, capture protocol)
//! - Тактический слой (физика, рендер, pathfinding, анимации) — внешний,
//!   подключается через service traits (src/services) и MovementCommand

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod ai;
pub mod components;
pub mod logger;
pub mod navigation;
pub mod perception;
pub mod services;

// Re-export базовых типов для удобства
pub use ai::{
    AIPlugin, AIState, AnimationCue, CaptureState, CueKind, NoiseEvent, NoiseHeard, TargetCaptured,
};
pub use components::*;
pub use navigation::{NavAgent, NavigationPlugin};
pub use perception::{
    LastKnownPositions, PerceptionPlugin, VisibleSet, VisionCone, EAR_HEIGHT, EYE_HEIGHT,
};
pub use services::{
    AnimationSinkService, NavMeshService, OcclusionService, PhysicsProxyService, PossessionService,
    RayHit,
};

/// Фазы симуляционного тика (FixedUpdate)
///
/// Жёсткая цепочка: свежая перцепция → решения → capture → движение.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Perception,
    Decision,
    Capture,
    Movement,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick (легче считать интервалы)
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Perception,
                    SimulationSet::Decision,
                    SimulationSet::Capture,
                    SimulationSet::Movement,
                )
                    .chain(),
            )
            // Подсистемы (ECS strategic layer)
            .add_plugins((PerceptionPlugin, AIPlugin, NavigationPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигаем вручную чуть больше 1/60 сек за update — прогоны не зависят
/// от wall clock, каждый app.update() == один FixedUpdate тик.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_micros(
            16_667,
        )));

    app
}

/// Snapshot мира для сравнения детерминизма
/// (упрощённая версия: Debug-формат компонентов, отсортированный по Entity)
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
