//! FSM AI systems (DogBrain tick каждый fixed step).

use bevy::prelude::*;

use crate::ai::events::DogStateChanged;
use crate::ai::oracles::Pose;
use crate::ai::{DogBrain, IdleZoneDirectory, TickContext};
use crate::components::{FacingCommand, MovementCommand, Player};
use crate::world::{CollisionWorld, NavMesh};
use crate::DeterministicRng;

/// Система: DogBrain tick
///
/// Для каждой собаки:
/// - собирает TickContext (поза, поза игрока, oracles, shared RNG)
/// - тикает state machine (детерминированный порядок: Entity order в Query)
/// - копирует MovementCommand / FacingCommand для locomotion
/// - пишет DogStateChanged при смене состояния
///
/// Ошибки (пустой directory) логируются, симуляция продолжается: повтор на следующем tick'е.
pub fn dog_brain_tick(
    mut dogs: Query<(&mut DogBrain, &Transform, &mut MovementCommand, &mut FacingCommand)>,
    players: Query<&Transform, With<Player>>,
    navmesh: Res<NavMesh>,
    collision: Res<CollisionWorld>,
    zones: Res<IdleZoneDirectory>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut state_events: EventWriter<DogStateChanged>,
) {
    let delta = time.delta_secs();

    for (mut brain, transform, mut movement, mut facing) in dogs.iter_mut() {
        // Без цели собаке не на что реагировать
        let Some(threat) = brain.perception().target().and_then(|target| players.get(target).ok()) else {
            crate::logger::log_warning(&format!(
                "⚠️ {:?}: tracked target {:?} not found, tick skipped",
                brain.agent(),
                brain.perception().target()
            ));
            continue;
        };

        let mut ctx = TickContext {
            pose: Pose::from_transform(transform),
            threat: Pose::from_transform(threat),
            navmesh: navmesh.0.as_ref(),
            obstruction: &collision.field,
            zones: &zones,
            rng: &mut rng.rng,
        };

        let previous = brain.current_state();
        if let Err(error) = brain.tick(&mut ctx, delta) {
            crate::logger::log_error(&format!("❌ {}", error));
        }

        let current = brain.current_state();
        if current != previous {
            state_events.write(DogStateChanged {
                dog: brain.agent(),
                from: previous,
                to: current,
            });
        }

        // Проверяем что команда изменилась: иначе Changed<MovementCommand> спамит
        let command = brain.movement_command();
        if *movement != command {
            *movement = command;
        }
        *facing = brain.facing();
    }
}
