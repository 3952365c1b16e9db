//! Headless симуляция Dog Park
//!
//! Игрок обходит парк по заранее заданному маршруту, собаки реагируют.
//! В конце игрок пытается поймать ближайшую собаку.

use bevy::prelude::*;
use dogpark_simulation::{
    create_headless_app, spawn_dog, spawn_obstacle, spawn_player, CatchAttempt, DogBrain, DogConfig,
    IdleZoneDirectory, MovementCommand, PerceptionConfig,
};

const TICKS: u32 = 1800;

fn main() {
    let seed = 42;
    println!("Starting Dog Park headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);

    let zones = vec![
        Vec3::new(-20.0, 0.0, -20.0),
        Vec3::new(20.0, 0.0, -20.0),
        Vec3::new(-20.0, 0.0, 20.0),
        Vec3::new(20.0, 0.0, 20.0),
        Vec3::new(0.0, 0.0, 0.0),
    ];
    app.insert_resource(IdleZoneDirectory::new(zones));

    let world = app.world_mut();
    let player = spawn_player(world, Vec3::new(0.0, 0.0, 40.0));
    spawn_obstacle(world, Vec3::new(0.0, 0.0, 10.0), 2.0);

    let dogs: Vec<Entity> = [Vec3::new(-10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -15.0)]
        .into_iter()
        .map(|position| {
            spawn_dog(
                world,
                player,
                Transform::from_translation(position),
                DogConfig::default(),
                PerceptionConfig::default(),
            )
        })
        .collect();

    // Маршрут игрока: через центр парка и обратно вдоль края
    let route = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(-15.0, 0.0, -10.0),
        Vec3::new(15.0, 0.0, -10.0),
        Vec3::new(0.0, 0.0, 20.0),
    ];
    let mut waypoint = 0;

    for tick in 0..TICKS {
        let position = app.world().get::<Transform>(player).map(|t| t.translation);
        if let Some(position) = position {
            if position.distance(route[waypoint]) < 0.5 && waypoint + 1 < route.len() {
                waypoint += 1;
            }
            if let Some(mut command) = app.world_mut().get_mut::<MovementCommand>(player) {
                *command = MovementCommand::MoveToPosition { target: route[waypoint] };
            }
        }

        app.update();

        if tick % 100 == 0 {
            print_states(&mut app, tick, &dogs);
        }
    }

    attempt_catch(&mut app, player, &dogs);
    app.update();
    app.update();
    print_states(&mut app, TICKS, &dogs);

    println!("Simulation complete!");
}

/// Разворачиваем игрока к ближайшей собаке и шлём CatchAttempt
fn attempt_catch(app: &mut App, player: Entity, dogs: &[Entity]) {
    let world = app.world_mut();
    let Some(player_position) = world.get::<Transform>(player).map(|t| t.translation) else {
        return;
    };

    let nearest = dogs
        .iter()
        .filter_map(|&dog| world.get::<Transform>(dog).map(|t| t.translation))
        .min_by(|a, b| a.distance(player_position).total_cmp(&b.distance(player_position)));

    if let (Some(target), Some(mut transform)) = (nearest, world.get_mut::<Transform>(player)) {
        transform.look_at(Vec3::new(target.x, player_position.y, target.z), Vec3::Y);
    }
    world.send_event(CatchAttempt { catcher: player });
}

fn print_states(app: &mut App, tick: u32, dogs: &[Entity]) {
    let world = app.world();
    let states: Vec<String> = dogs
        .iter()
        .filter_map(|&dog| {
            let brain = world.get::<DogBrain>(dog)?;
            let position = world.get::<Transform>(dog)?.translation;
            Some(format!("{:?}={} @ ({:.1}, {:.1})", dog, brain.current_state().as_str(), position.x, position.z))
        })
        .collect();
    println!("Tick {}: {}", tick, states.join(" | "));
}
