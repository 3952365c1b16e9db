//! Integration тесты полного цикла: шаги → слух/зрение → FSM → locomotion

use bevy::prelude::*;
use dogpark_simulation::ai::AISystems;
use dogpark_simulation::{
    create_headless_app, spawn_dog, spawn_player, CatchAttempt, DogBrain, DogCaught, DogConfig, DogState,
    DogStateChanged, IdleZoneDirectory, MovementCommand, PerceptionConfig, Posture, SoundChannel,
};

/// Журнал переходов (собирается из DogStateChanged)
#[derive(Resource, Default)]
struct TransitionLog(Vec<DogStateChanged>);

#[derive(Resource, Default)]
struct CaughtLog(Vec<DogCaught>);

fn record_transitions(mut events: EventReader<DogStateChanged>, mut log: ResMut<TransitionLog>) {
    log.0.extend(events.read().copied());
}

fn record_catches(mut events: EventReader<DogCaught>, mut log: ResMut<CaughtLog>) {
    log.0.extend(events.read().copied());
}

/// Парк: одна собака в (0,0,-3) смотрит в -Z, игрок далеко сзади
fn setup_park(seed: u64) -> (App, Entity, Entity) {
    let mut app = create_headless_app(seed);
    app.insert_resource(IdleZoneDirectory::new([
        Vec3::new(0.0, 0.0, -3.0),
        Vec3::new(-40.0, 0.0, -40.0),
    ]))
    .init_resource::<TransitionLog>()
    .init_resource::<CaughtLog>()
    .add_systems(FixedUpdate, (record_transitions, record_catches).after(AISystems));

    let world = app.world_mut();
    let player = spawn_player(world, Vec3::new(0.0, 0.0, 30.0));
    let config = DogConfig {
        rest_spot_jitter: 0.0,
        ..Default::default()
    };
    let dog = spawn_dog(
        world,
        player,
        Transform::from_translation(Vec3::ZERO),
        config,
        PerceptionConfig::default(),
    );

    (app, player, dog)
}

fn walk_player(app: &mut App, player: Entity, target: Vec3) {
    *app.world_mut().get_mut::<MovementCommand>(player).unwrap() = MovementCommand::MoveToPosition { target };
}

fn dog_state(app: &App, dog: Entity) -> DogState {
    app.world().get::<DogBrain>(dog).unwrap().current_state()
}

#[test]
fn test_dog_rests_then_flees_from_approaching_player() {
    let (mut app, player, dog) = setup_park(7);

    // Собака находит место отдыха рядом и засыпает/копает/прячется
    let mut rested = false;
    for _ in 0..30 {
        app.update();
        if dog_state(&app, dog).is_idle() {
            rested = true;
            break;
        }
    }
    assert!(rested, "dog never reached an idle state");

    // Подходим вплотную сзади: сначала Alert (< 10), потом Panic (< 5)
    walk_player(&mut app, player, Vec3::new(0.0, 0.0, 0.0));

    let mut fled = false;
    for _ in 0..900 {
        app.update();
        if dog_state(&app, dog) == DogState::Fleeing {
            fled = true;
            break;
        }
    }
    assert!(fled, "dog never fled from the player");

    // Бежим прочь от игрока
    let brain = app.world().get::<DogBrain>(dog).unwrap();
    let destination = brain.flee_destination().expect("flee destination");
    let player_position = app.world().get::<Transform>(player).unwrap().translation;
    assert!(destination.distance(player_position) > 10.0);
    assert_eq!(
        *app.world().get::<MovementCommand>(dog).unwrap(),
        MovementCommand::MoveToPosition { target: destination }
    );

    let log = app.world().resource::<TransitionLog>();
    assert!(log.0.iter().any(|e| e.dog == dog && e.to == DogState::Fleeing));
}

#[test]
fn test_crouching_player_sneaks_past() {
    let (mut app, player, dog) = setup_park(7);
    app.world_mut().get_mut::<Posture>(player).unwrap().crouched = true;

    for _ in 0..30 {
        app.update();
    }
    assert!(dog_state(&app, dog).is_idle());

    // Подкрадываемся сзади на 6 метров (слышно было бы Alert)
    walk_player(&mut app, player, Vec3::new(0.0, 0.0, 3.0));
    for _ in 0..600 {
        app.update();
        let state = dog_state(&app, dog);
        assert!(
            !matches!(state, DogState::AlertSearching | DogState::Fleeing),
            "dog noticed a crouching player: {:?}",
            state
        );
    }
}

#[test]
fn test_catch_attempt_captures_dog_in_front() {
    let (mut app, player, dog) = setup_park(7);
    app.update();

    // Игрок за спиной собаки, смотрит на неё
    app.world_mut()
        .entity_mut(player)
        .insert(Transform::from_xyz(0.0, 0.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y));
    app.world_mut().send_event(CatchAttempt { catcher: player });

    for _ in 0..5 {
        app.update();
    }

    let brain = app.world().get::<DogBrain>(dog).unwrap();
    assert!(brain.is_captured());
    assert_eq!(brain.current_state(), DogState::Caught);

    let caught = app.world().resource::<CaughtLog>();
    assert_eq!(caught.0.len(), 1);
    assert_eq!(caught.0[0].dog, dog);
    assert_eq!(caught.0[0].catcher, player);

    // Игрок уходит: пойманная собака следует за ним
    walk_player(&mut app, player, Vec3::new(0.0, 0.0, 40.0));
    for _ in 0..300 {
        app.update();
    }
    assert_eq!(dog_state(&app, dog), DogState::Caught);
    let dog_position = app.world().get::<Transform>(dog).unwrap().translation;
    assert!(dog_position.z > 5.0, "caught dog stayed behind at {dog_position}");
}

#[test]
fn test_catch_attempt_facing_away_misses() {
    let (mut app, player, dog) = setup_park(7);
    app.update();

    app.world_mut()
        .entity_mut(player)
        .insert(Transform::from_xyz(0.0, 0.0, 5.0).looking_at(Vec3::new(0.0, 0.0, 20.0), Vec3::Y));
    app.world_mut().send_event(CatchAttempt { catcher: player });

    for _ in 0..5 {
        app.update();
    }

    assert!(!app.world().get::<DogBrain>(dog).unwrap().is_captured());
    assert!(app.world().resource::<CaughtLog>().0.is_empty());
}

#[test]
fn test_despawned_dog_stops_listening() {
    let (mut app, player, dog) = setup_park(7);
    assert_eq!(app.world().resource::<SoundChannel>().listener_count(player), 1);

    app.world_mut().despawn(dog);
    assert_eq!(app.world().resource::<SoundChannel>().listener_count(player), 0);

    // Игрок продолжает шуметь: никто не слушает, симуляция идёт дальше
    walk_player(&mut app, player, Vec3::new(0.0, 0.0, 0.0));
    for _ in 0..60 {
        app.update();
    }
}
