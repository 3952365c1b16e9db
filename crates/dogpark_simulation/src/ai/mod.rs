//! AI decision-making module
//!
//! Dog behavior: perception (vision cone + hearing) → DogBrain FSM → MovementCommand.
//!
//! Слои:
//! - core (plain Rust, тестируется без App): perception, sound, idle_zones, brain, oracles
//! - ECS (Bevy): components, events, systems, spawn helpers

use bevy::prelude::*;

pub mod brain;
pub mod components;
pub mod events;
pub mod idle_zones;
pub mod oracles;
pub mod perception;
pub mod sound;
pub mod spawn;
pub mod systems;

#[cfg(test)]
mod brain_tests;

// Re-export основных типов
pub use brain::{BrainError, BrainResult, DogBrain, NavigationMiss, NavigationPurpose, TickContext, TickReport};
pub use components::{DogConfig, DogState, SearchState};
pub use events::{CatchAttempt, DogCaught, DogStateChanged, FootstepMade};
pub use idle_zones::{DirectoryError, DirectoryResult, IdleZoneDirectory};
pub use perception::{DetectionLevel, PerceptionConfig, PerceptionUnit};
pub use sound::{EmitterId, SoundChannel, SoundEvent, SoundListener, SoundSubscription};
pub use spawn::{spawn_dog, spawn_obstacle, spawn_player, Dog};

/// AI system set (locomotion запускается после)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AISystems;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
/// Порядок выполнения:
/// 1. sync_collision_world: Transform → line-of-sight colliders
/// 2. sync_listener_positions: позиция "уха" каждой собаки
/// 3. emit_footsteps: игрок сдвинулся → FootstepMade
/// 4. publish_footsteps: FootstepMade → SoundChannel (Hearing собак)
/// 5. resolve_catch_attempts: CatchAttempt → notify_captured
/// 6. dog_brain_tick: FSM + MovementCommand/FacingCommand
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SoundChannel>()
            .init_resource::<IdleZoneDirectory>()
            .init_resource::<crate::world::NavMesh>()
            .init_resource::<crate::world::CollisionWorld>()
            .add_event::<FootstepMade>()
            .add_event::<CatchAttempt>()
            .add_event::<DogCaught>()
            .add_event::<DogStateChanged>()
            .add_systems(
                FixedUpdate,
                (
                    crate::world::sync_collision_world,
                    systems::sync_listener_positions,
                    systems::emit_footsteps,
                    systems::publish_footsteps,
                    systems::resolve_catch_attempts,
                    systems::dog_brain_tick,
                )
                    .chain() // Последовательное выполнение для детерминизма
                    .in_set(AISystems),
            );
    }
}
