//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: игрок (Player, Posture, Footsteps)
//! - movement: команды перемещения/поворота (MovementCommand, FacingCommand, MovementSpeed)
//!
//! AI компоненты (DogBrain, DogConfig) живут в `crate::ai::components`.

pub mod actor;
pub mod movement;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
