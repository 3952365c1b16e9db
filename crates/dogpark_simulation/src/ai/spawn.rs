//! Spawn helpers: собаки (с подпиской на игрока), игрок, препятствия

use bevy::prelude::*;

use super::components::DogConfig;
use super::oracles::layers;
use super::perception::{PerceptionConfig, PerceptionUnit};
use super::sound::SoundChannel;
use super::DogBrain;
use crate::components::{FacingCommand, MovementCommand, MovementSpeed, Player};
use crate::world::{Collider, Obstacle};

/// Радиус тела собаки / игрока для line-of-sight
pub const DOG_RADIUS: f32 = 0.4;
pub const PLAYER_RADIUS: f32 = 0.5;

/// Маркер собаки
///
/// Required: MovementCommand / FacingCommand (пишет brain, читает locomotion)
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(MovementCommand, FacingCommand, MovementSpeed)]
pub struct Dog;

/// Spawn игрока (emitter шагов)
pub fn spawn_player(world: &mut World, position: Vec3) -> Entity {
    world
        .spawn((
            Player,
            Transform::from_translation(position),
            Collider::sphere(PLAYER_RADIUS, layers::PLAYER),
            MovementSpeed { speed: 5.0 },
        ))
        .id()
}

/// Spawn собаки, следящей за `player`
///
/// Подписка на шаги создаётся сразу; снимается автоматически при despawn
/// (SoundSubscription живёт внутри DogBrain).
pub fn spawn_dog(
    world: &mut World,
    player: Entity,
    transform: Transform,
    config: DogConfig,
    perception: PerceptionConfig,
) -> Entity {
    let entity = world
        .spawn((Dog, transform, Collider::sphere(DOG_RADIUS, layers::DOGS)))
        .id();

    let channel = world.get_resource_or_insert_with(SoundChannel::default).clone();
    let mut perception = PerceptionUnit::new(perception, transform.translation);
    perception.track(&channel, player);

    world
        .entity_mut(entity)
        .insert(DogBrain::new(entity, config, perception));

    crate::logger::log(&format!("🐕 Spawned dog {:?} at {} (tracking {:?})", entity, transform.translation, player));
    entity
}

/// Spawn статичного препятствия (закрывает обзор)
pub fn spawn_obstacle(world: &mut World, position: Vec3, radius: f32) -> Entity {
    world
        .spawn((
            Obstacle,
            Transform::from_translation(position),
            Collider::sphere(radius, layers::ENVIRONMENT),
        ))
        .id()
}
