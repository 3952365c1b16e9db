//! Tests for DogBrain state machine (без App: oracles + RNG напрямую).

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::brain::{BrainError, BrainResult, DogBrain, NavigationPurpose, TickContext, TickReport};
use super::components::{DogConfig, DogState};
use super::idle_zones::{DirectoryError, IdleZoneDirectory};
use super::oracles::{layers, ColliderField, FlatNavMesh, Pose, SphereCollider};
use super::perception::{DetectionLevel, PerceptionConfig, PerceptionUnit};
use super::sound::{SoundChannel, SoundEvent};
use crate::components::{FacingCommand, MovementCommand};

const DOG: Entity = Entity::from_raw(1);
const PLAYER: Entity = Entity::from_raw(2);

/// Собака смотрит в -Z; игрок "сзади" (+Z) её не видно
const DOG_FORWARD: Vec3 = Vec3::NEG_Z;

struct Park {
    channel: SoundChannel,
    navmesh: FlatNavMesh,
    field: ColliderField,
    zones: IdleZoneDirectory,
    rng: ChaCha8Rng,
}

impl Park {
    fn new(zones: Vec<Vec3>) -> Self {
        Self {
            channel: SoundChannel::new(),
            navmesh: FlatNavMesh::square(50.0),
            field: ColliderField::new(),
            zones: IdleZoneDirectory::new(zones),
            rng: ChaCha8Rng::seed_from_u64(7),
        }
    }

    fn dog(&self, config: DogConfig) -> DogBrain {
        let mut perception = PerceptionUnit::new(PerceptionConfig::default(), Vec3::ZERO);
        perception.track(&self.channel, PLAYER);
        DogBrain::new(DOG, config, perception)
    }

    fn footstep(&self, position: Vec3) {
        self.channel.publish(PLAYER, SoundEvent::footstep(position, false));
    }

    fn tick(&mut self, brain: &mut DogBrain, dog: Vec3, player: Vec3, delta: f32) -> BrainResult<TickReport> {
        let mut ctx = TickContext {
            pose: Pose::new(dog, DOG_FORWARD),
            threat: Pose::new(player, Vec3::NEG_Z),
            navmesh: &self.navmesh,
            obstruction: &self.field,
            zones: &self.zones,
            rng: &mut self.rng,
        };
        brain.tick(&mut ctx, delta)
    }
}

fn no_jitter() -> DogConfig {
    DogConfig {
        rest_spot_jitter: 0.0,
        ..Default::default()
    }
}

#[test]
fn test_close_footstep_triggers_flee_away_from_player() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());

    // Дистанция 4 < hearing_radius/2 = 5 → Panic
    let player = Vec3::new(0.0, 0.0, 4.0);
    park.footstep(player);
    assert_eq!(brain.perception().heard_level(), DetectionLevel::Panic);

    let report = park.tick(&mut brain, Vec3::ZERO, player, 1.0 / 60.0).unwrap();
    assert_eq!(report.detection, DetectionLevel::Panic);
    assert_eq!(report.state, DogState::Fleeing);
    assert!(report.changed());

    // Бежим на flee_distance от игрока
    let expected = Vec3::new(0.0, 0.0, -15.0);
    assert_eq!(brain.flee_destination(), Some(expected));
    assert_eq!(brain.movement_command(), MovementCommand::MoveToPosition { target: expected });
    assert_eq!(brain.facing(), FacingCommand::LookAt { point: expected });
}

#[test]
fn test_flee_arrival_returns_to_patrol_undecided() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());
    let player = Vec3::new(0.0, 0.0, 4.0);

    park.footstep(player);
    park.tick(&mut brain, Vec3::ZERO, player, 1.0 / 60.0).unwrap();
    assert_eq!(brain.current_state(), DogState::Fleeing);

    // Ещё далеко (6 > arrival 5)
    park.tick(&mut brain, Vec3::new(0.0, 0.0, -9.0), player, 1.0 / 60.0).unwrap();
    assert_eq!(brain.current_state(), DogState::Fleeing);

    // 4 от точки бегства → пришли
    let report = park.tick(&mut brain, Vec3::new(0.0, 0.0, -11.0), player, 1.0 / 60.0).unwrap();
    assert_eq!(report.state, DogState::PatrolFindingRestSpot);
    assert!(!brain.rest_spot_decided());
}

#[test]
fn test_captured_dog_stays_caught() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());

    // Дистанция 7: Alert
    let player = Vec3::new(0.0, 0.0, 7.0);
    park.footstep(player);
    park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    assert_eq!(brain.current_state(), DogState::AlertSearching);

    brain.notify_captured();
    let report = park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    assert_eq!(report.state, DogState::Caught);
    assert_eq!(brain.movement_command(), MovementCommand::Stop);

    // Panic больше ничего не меняет
    park.footstep(Vec3::new(0.0, 0.0, 1.0));
    let report = park.tick(&mut brain, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 0.1).unwrap();
    assert_eq!(report.state, DogState::Caught);
    assert_eq!(report.detection, DetectionLevel::None);
    assert!(brain.is_captured());
}

#[test]
fn test_caught_dog_follows_catcher_beyond_leash() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());
    brain.notify_captured();

    // В пределах поводка: стоим
    park.tick(&mut brain, Vec3::ZERO, Vec3::new(0.0, 0.0, 8.0), 0.1).unwrap();
    assert_eq!(brain.current_state(), DogState::Caught);
    assert_eq!(brain.movement_command(), MovementCommand::Stop);

    let catcher = Vec3::new(0.0, 0.0, 20.0);
    park.tick(&mut brain, Vec3::ZERO, catcher, 0.1).unwrap();
    assert_eq!(brain.movement_command(), MovementCommand::MoveToPosition { target: catcher });
}

#[test]
fn test_caught_dog_stops_once_back_on_leash() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());
    brain.notify_captured();

    let old_catcher = Vec3::new(0.0, 0.0, 20.0);
    park.tick(&mut brain, Vec3::ZERO, old_catcher, 0.1).unwrap();
    assert_eq!(brain.movement_command(), MovementCommand::MoveToPosition { target: old_catcher });

    // Игрок вернулся навстречу: 5 метров, старую цель не догоняем
    park.tick(&mut brain, Vec3::new(0.0, 0.0, 15.0), Vec3::new(0.0, 0.0, 10.0), 0.1).unwrap();
    assert_eq!(brain.current_state(), DogState::Caught);
    assert_eq!(brain.movement_command(), MovementCommand::Stop);
}

#[test]
fn test_panic_from_idle_flees() {
    let zone = Vec3::new(3.0, 0.0, 0.0);
    let mut park = Park::new(vec![zone]);
    let mut brain = park.dog(no_jitter());
    let far_player = Vec3::new(0.0, 0.0, 45.0);

    park.tick(&mut brain, Vec3::ZERO, far_player, 0.1).unwrap();
    assert!(brain.current_state().is_idle());

    let player = Vec3::new(0.0, 0.0, 4.0);
    park.footstep(player);
    let report = park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    assert!(report.previous.is_idle());
    assert_eq!(report.state, DogState::Fleeing);
    assert_eq!(brain.flee_destination(), Some(Vec3::new(0.0, 0.0, -15.0)));
}

#[test]
fn test_panic_interrupts_search() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());

    park.footstep(Vec3::new(0.0, 0.0, 7.0));
    park.tick(&mut brain, Vec3::ZERO, Vec3::new(0.0, 0.0, 7.0), 0.1).unwrap();
    assert_eq!(brain.current_state(), DogState::AlertSearching);

    let player = Vec3::new(0.0, 0.0, 4.0);
    park.footstep(player);
    let report = park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    assert_eq!(report.previous, DogState::AlertSearching);
    assert_eq!(report.state, DogState::Fleeing);
    assert_eq!(brain.search().elapsed, 0.0);
}

#[test]
fn test_panic_clears_decided_rest_spot() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());

    park.tick(&mut brain, Vec3::ZERO, Vec3::new(0.0, 0.0, 45.0), 0.1).unwrap();
    assert_eq!(brain.current_state(), DogState::PatrolFindingRestSpot);
    assert!(brain.rest_spot_decided());

    let player = Vec3::new(0.0, 0.0, 4.0);
    park.footstep(player);
    park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    assert_eq!(brain.current_state(), DogState::Fleeing);
    assert!(!brain.rest_spot_decided());
}

#[test]
fn test_alert_does_not_interrupt_flee() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());
    let player = Vec3::new(0.0, 0.0, 4.0);

    park.footstep(player);
    park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    let destination = brain.flee_destination();

    park.footstep(Vec3::new(0.0, 0.0, 7.0));
    let report = park.tick(&mut brain, Vec3::ZERO, Vec3::new(0.0, 0.0, 7.0), 0.1).unwrap();
    assert_eq!(report.detection, DetectionLevel::Alert);
    assert_eq!(report.state, DogState::Fleeing);
    assert_eq!(brain.flee_destination(), destination);
}

#[test]
fn test_hearing_memory_is_consumed_once() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());
    let player = Vec3::new(0.0, 0.0, 4.0);

    // Два шага до tick'а: одна реакция
    park.footstep(player);
    park.footstep(player);

    let first = park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    assert_eq!(first.detection, DetectionLevel::Panic);

    let second = park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    assert_eq!(second.detection, DetectionLevel::None);
    assert_eq!(brain.perception().heard_level(), DetectionLevel::None);
}

#[test]
fn test_patrol_does_not_repeat_previous_zone() {
    let a = Vec3::new(10.0, 0.0, 0.0);
    let b = Vec3::new(-10.0, 0.0, 0.0);
    let mut park = Park::new(vec![a, b]);
    let mut brain = park.dog(no_jitter());
    let far_player = Vec3::new(0.0, 0.0, 45.0);

    park.tick(&mut brain, Vec3::new(30.0, 0.0, 0.0), far_player, 0.1).unwrap();
    assert_eq!(brain.chosen_rest_spot(), Some(a));
    assert_eq!(brain.movement_command(), MovementCommand::MoveToPosition { target: a });

    // Пришли → idle
    let report = park.tick(&mut brain, a, far_player, 0.1).unwrap();
    assert!(report.state.is_idle(), "{:?}", report.state);

    // Alert → поиск → обратно в patrol
    park.footstep(Vec3::new(10.0, 0.0, 7.0));
    park.tick(&mut brain, a, far_player, 0.1).unwrap();
    assert_eq!(brain.current_state(), DogState::AlertSearching);
    park.tick(&mut brain, a, far_player, 10.0).unwrap();
    assert_eq!(brain.current_state(), DogState::PatrolFindingRestSpot);

    // Ближайшая A исключена
    park.tick(&mut brain, a, far_player, 0.1).unwrap();
    assert_eq!(brain.chosen_rest_spot(), Some(b));
    assert_eq!(brain.prev_rest_spot(), Some(b));
}

#[test]
fn test_rest_spot_jitter_stays_within_bounds() {
    let zone = Vec3::new(20.0, 0.0, 0.0);
    let mut park = Park::new(vec![zone]);
    let mut brain = park.dog(DogConfig::default());

    park.tick(&mut brain, Vec3::new(-30.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 45.0), 0.1).unwrap();

    let spot = brain.chosen_rest_spot().unwrap();
    assert!((spot.x - zone.x).abs() <= 10.0);
    assert!((spot.z - zone.z).abs() <= 10.0);
    assert_eq!(spot.y, 0.0);
}

#[test]
fn test_empty_directory_is_an_error() {
    let mut park = Park::new(Vec::new());
    let mut brain = park.dog(no_jitter());

    let result = park.tick(&mut brain, Vec3::ZERO, Vec3::new(0.0, 0.0, 45.0), 0.1);
    assert!(matches!(
        result,
        Err(BrainError::RestSpot { source: DirectoryError::Empty, .. })
    ));
    assert_eq!(brain.current_state(), DogState::PatrolFindingRestSpot);
    assert!(!brain.rest_spot_decided());
}

#[test]
fn test_single_zone_already_used_is_an_error() {
    let zone = Vec3::new(3.0, 0.0, 0.0);
    let mut park = Park::new(vec![zone]);
    let mut brain = park.dog(no_jitter());
    let far_player = Vec3::new(0.0, 0.0, 45.0);

    // Выбрали и сразу пришли (3 < 5)
    park.tick(&mut brain, Vec3::ZERO, far_player, 0.1).unwrap();
    assert!(brain.current_state().is_idle());

    park.footstep(Vec3::new(0.0, 0.0, 7.0));
    park.tick(&mut brain, Vec3::ZERO, far_player, 10.0).unwrap();
    assert_eq!(brain.current_state(), DogState::PatrolFindingRestSpot);

    let result = park.tick(&mut brain, Vec3::ZERO, far_player, 0.1);
    assert!(matches!(
        result,
        Err(BrainError::RestSpot { source: DirectoryError::NoEligibleZone { .. }, .. })
    ));
}

#[test]
fn test_navmesh_miss_is_reported_and_retried() {
    let mut park = Park::new(vec![Vec3::new(40.0, 0.0, 0.0)]);
    park.navmesh = FlatNavMesh::square(5.0);
    let mut brain = park.dog(no_jitter());

    let report = park.tick(&mut brain, Vec3::ZERO, Vec3::new(0.0, 0.0, 4.5), 0.1).unwrap();
    let miss = report.navigation_miss.expect("projection should miss");
    assert_eq!(miss.purpose, NavigationPurpose::RestSpot);
    assert_eq!(miss.attempted, Vec3::new(40.0, 0.0, 0.0));
    assert_eq!(report.state, DogState::PatrolFindingRestSpot);
    assert!(!brain.rest_spot_decided());
    assert_eq!(brain.prev_rest_spot(), None);

    // Площадка расширилась → следующий tick успешен
    park.navmesh = FlatNavMesh::square(50.0);
    let report = park.tick(&mut brain, Vec3::ZERO, Vec3::new(0.0, 0.0, 4.5), 0.1).unwrap();
    assert!(report.navigation_miss.is_none());
    assert!(brain.rest_spot_decided());
}

#[test]
fn test_flee_miss_keeps_retrying() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    // Walkable только далёкий угол: точка бегства не проецируется
    park.navmesh = FlatNavMesh::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0), 0.0);
    let mut brain = park.dog(no_jitter());
    let player = Vec3::new(0.0, 0.0, 4.0);

    park.footstep(player);
    let report = park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    assert_eq!(report.state, DogState::Fleeing);
    assert_eq!(report.navigation_miss.map(|m| m.purpose), Some(NavigationPurpose::Flee));
    assert_eq!(brain.flee_destination(), None);

    park.navmesh = FlatNavMesh::square(50.0);
    park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    assert_eq!(brain.flee_destination(), Some(Vec3::new(0.0, 0.0, -15.0)));
}

#[test]
fn test_search_turns_in_place() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());

    park.footstep(Vec3::new(0.0, 0.0, 7.0));
    park.tick(&mut brain, Vec3::ZERO, Vec3::new(0.0, 0.0, 7.0), 0.5).unwrap();

    assert_eq!(brain.current_state(), DogState::AlertSearching);
    assert_eq!(brain.movement_command(), MovementCommand::Stop);
    assert_eq!(brain.facing(), FacingCommand::Turn { degrees: 17.5 });

    let duration = brain.search().target_duration;
    assert!((3.0..=6.0).contains(&duration), "duration = {duration}");
}

#[test]
fn test_seen_player_triggers_panic() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let player = Vec3::new(0.0, 0.0, -6.0);
    park.field.insert(SphereCollider { owner: PLAYER, center: player, radius: 0.5, layers: layers::PLAYER });
    let mut brain = park.dog(no_jitter());

    let report = park.tick(&mut brain, Vec3::ZERO, player, 0.1).unwrap();
    assert_eq!(report.detection, DetectionLevel::Panic);
    assert_eq!(report.state, DogState::Fleeing);
    // От игрока (который впереди): назад
    assert_eq!(brain.flee_destination(), Some(Vec3::new(0.0, 0.0, 15.0)));
}

#[test]
fn test_reset_restores_initial_state() {
    let mut park = Park::new(vec![Vec3::new(30.0, 0.0, 0.0)]);
    let mut brain = park.dog(no_jitter());
    brain.notify_captured();
    park.tick(&mut brain, Vec3::ZERO, Vec3::new(0.0, 0.0, 20.0), 0.1).unwrap();
    park.footstep(Vec3::new(0.0, 0.0, 1.0));

    brain.reset();

    assert_eq!(brain.current_state(), DogState::PatrolFindingRestSpot);
    assert!(!brain.is_captured());
    assert_eq!(brain.movement_command(), MovementCommand::Idle);
    assert_eq!(brain.perception().heard_level(), DetectionLevel::None);
    // Подписка переживает reset
    assert!(brain.perception().is_subscribed());
}
