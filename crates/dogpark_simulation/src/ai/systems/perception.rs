//! Perception systems: шаги игрока → SoundChannel → Hearing собак.

use bevy::prelude::*;

use crate::ai::events::FootstepMade;
use crate::ai::sound::{SoundChannel, SoundEvent};
use crate::ai::DogBrain;
use crate::components::{Footsteps, Player, Posture};

/// Система: позиция "уха" = Transform собаки
///
/// Запускается ДО publish_footsteps: дистанция до шага считается от актуальной позиции.
pub fn sync_listener_positions(dogs: Query<(&Transform, &DogBrain)>) {
    for (transform, brain) in dogs.iter() {
        brain.perception().set_position(transform.translation);
    }
}

/// Система: игрок сдвинулся за tick → FootstepMade
///
/// Шумим каждый fixed tick в котором было движение (crouch помечается quiet).
pub fn emit_footsteps(
    mut players: Query<(Entity, &Transform, &Posture, &mut Footsteps), With<Player>>,
    mut footsteps: EventWriter<FootstepMade>,
) {
    for (entity, transform, posture, mut steps) in players.iter_mut() {
        let position = transform.translation;
        let moved = steps
            .last_position
            .is_some_and(|last| last.distance(position) > Footsteps::STEP_EPSILON);
        steps.last_position = Some(position);

        if moved {
            footsteps.write(FootstepMade {
                emitter: entity,
                position,
                quiet: posture.crouched,
            });
        }
    }
}

/// Система: FootstepMade → SoundChannel.publish (синхронная доставка всем подписчикам)
pub fn publish_footsteps(mut footsteps: EventReader<FootstepMade>, channel: Res<SoundChannel>) {
    for footstep in footsteps.read() {
        channel.publish(
            footstep.emitter,
            SoundEvent::footstep(footstep.position, footstep.quiet),
        );
    }
}
