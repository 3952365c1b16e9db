//! Locomotion: исполнитель MovementCommand / FacingCommand
//!
//! AI только пишет intent (куда идти, куда смотреть). Здесь intent превращается
//! в Transform: прямолинейный шаг к уже спроецированной на NavMesh точке
//! и yaw-поворот. Engine bridge может заменить этот plugin своим NavigationAgent.

use bevy::prelude::*;

use crate::ai::AISystems;
use crate::components::{FacingCommand, MovementCommand, MovementSpeed};

/// Ближе этого считаем что пришли (метры)
pub const ARRIVAL_EPSILON: f32 = 0.01;

/// Locomotion plugin (после AI в том же fixed tick)
pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (apply_facing, follow_movement_commands)
                .chain()
                .after(AISystems),
        );
    }
}

/// Система: FacingCommand → yaw
///
/// LookAt игнорирует высоту точки (актор не наклоняется).
pub fn apply_facing(mut actors: Query<(&mut Transform, &FacingCommand)>) {
    for (mut transform, facing) in actors.iter_mut() {
        match *facing {
            FacingCommand::Hold => {}
            FacingCommand::LookAt { point } => {
                let target = Vec3::new(point.x, transform.translation.y, point.z);
                if transform.translation.distance(target) > ARRIVAL_EPSILON {
                    transform.look_at(target, Vec3::Y);
                }
            }
            FacingCommand::Turn { degrees } => {
                transform.rotate_y(degrees.to_radians());
            }
        }
    }
}

/// Система: MovementCommand → шаг к цели (speed * delta, без overshoot)
pub fn follow_movement_commands(
    mut actors: Query<(&mut Transform, &MovementCommand, &MovementSpeed)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut transform, command, speed) in actors.iter_mut() {
        let Some(target) = command.target() else {
            continue;
        };

        let to_target = target - transform.translation;
        let distance = to_target.length();
        if distance <= ARRIVAL_EPSILON {
            continue;
        }

        let step = (speed.speed * delta).min(distance);
        transform.translation += to_target / distance * step;
    }
}
