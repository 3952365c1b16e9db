//! AI Events: шаги, поимка, смена состояний
//!
//! Flow:
//! - Player двигается → FootstepMade → SoundChannel.publish → Hearing собак
//! - Player ловит → CatchAttempt → raycast → DogBrain::notify_captured → DogCaught
//! - DogBrain tick сменил состояние → DogStateChanged (UI label / telemetry)

use bevy::prelude::*;

use super::components::DogState;

/// Emitter сделал шаг (шумит)
#[derive(Event, Debug, Clone, Copy)]
pub struct FootstepMade {
    pub emitter: Entity,
    pub position: Vec3,
    /// Crouch: собаки не слышат
    pub quiet: bool,
}

/// Игрок пытается поймать собаку перед собой
#[derive(Event, Debug, Clone, Copy)]
pub struct CatchAttempt {
    pub catcher: Entity,
}

/// Собака поймана (для score / UI снаружи)
#[derive(Event, Debug, Clone, Copy)]
pub struct DogCaught {
    pub dog: Entity,
    pub catcher: Entity,
}

/// Состояние собаки изменилось за tick
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DogStateChanged {
    pub dog: Entity,
    pub from: DogState,
    pub to: DogState,
}
