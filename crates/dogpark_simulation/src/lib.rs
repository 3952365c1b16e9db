//! Dog Park Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: собаки в парке отдыхают, слушают шаги игрока,
//! высматривают его в vision cone и убегают; игрок пытается их поймать.
//!
//! Слои:
//! - ai: perception + sound channel + DogBrain FSM (plain Rust, тестируется без App)
//! - world: headless NavMesh / line-of-sight oracles
//! - movement: locomotion executor (MovementCommand → Transform)

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod ai;
pub mod components;
pub mod logger;
pub mod movement;
pub mod world;

// Re-export базовых типов для удобства
pub use ai::{
    spawn_dog, spawn_obstacle, spawn_player, AIPlugin, CatchAttempt, DetectionLevel, Dog, DogBrain, DogCaught,
    DogConfig, DogState, DogStateChanged, IdleZoneDirectory, PerceptionConfig, SoundChannel,
};
pub use components::*;
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter};
pub use movement::MovementPlugin;
pub use world::{Collider, CollisionWorld, NavMesh};

/// Частота fixed tick'а симуляции
pub const SIMULATION_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
            // Seed задаётся create_headless_app; иначе DeterministicRng::default()
            .init_resource::<DeterministicRng>()
            .add_plugins((AIPlugin, MovementPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Единственный источник случайности симуляции: длительность поиска,
/// разброс rest spot, выбор idle состояния.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub const DEFAULT_SEED: u64 = 42;

    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Каждый `app.update()` продвигает время ровно на один fixed tick
/// (первый update только инициализирует часы).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / SIMULATION_HZ,
        )))
        .add_plugins(SimulationPlugin);

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
