//! AI reaction systems (поимка собаки игроком).

use bevy::prelude::*;

use crate::ai::events::{CatchAttempt, DogCaught};
use crate::ai::oracles::{layers, LayerMask, ObstructionOracle};
use crate::ai::DogBrain;
use crate::world::CollisionWorld;

/// Дальность "сачка" игрока (метры)
pub const CATCH_RANGE: f32 = 10.0;

/// System: CatchAttempt → raycast вперёд → notify_captured
///
/// Луч видит только собак (стены не мешают сачку).
/// Уже пойманная собака второй раз не засчитывается.
pub fn resolve_catch_attempts(
    mut attempts: EventReader<CatchAttempt>,
    catchers: Query<&Transform>,
    mut dogs: Query<&mut DogBrain>,
    collision: Res<CollisionWorld>,
    mut caught_events: EventWriter<DogCaught>,
) {
    for attempt in attempts.read() {
        let Ok(catcher) = catchers.get(attempt.catcher) else {
            continue;
        };

        let hit = collision.field.raycast(
            catcher.translation,
            *catcher.forward(),
            CATCH_RANGE,
            LayerMask::all_except(layers::DOGS),
        );
        let Some(dog) = hit else {
            crate::logger::log(&format!("🥅 {:?} catch attempt missed", attempt.catcher));
            continue;
        };

        let Ok(mut brain) = dogs.get_mut(dog) else {
            continue;
        };

        if brain.is_captured() {
            continue;
        }

        brain.notify_captured();
        caught_events.write(DogCaught {
            dog,
            catcher: attempt.catcher,
        });
    }
}
