//! Акторы парка: игрок (emitter шагов) и его поза

use bevy::prelude::*;

use crate::components::{MovementCommand, MovementSpeed};

/// Игрок: единственная цель, за которой следят собаки
///
/// Required: Posture (crouch), Footsteps (шумит при движении).
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(Posture, Footsteps, MovementCommand, MovementSpeed)]
pub struct Player;

/// Поза игрока
///
/// crouched == тихая поза: шаги не слышны собакам.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Posture {
    pub crouched: bool,
}

/// Трекинг шагов: шумим каждый fixed tick в котором сдвинулись
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Footsteps {
    /// Позиция на прошлом tick'е (None до первого tick'а)
    pub last_position: Option<Vec3>,
}

impl Footsteps {
    /// Минимальный сдвиг за tick, который считается шагом (метры)
    pub const STEP_EPSILON: f32 = 0.001;
}
