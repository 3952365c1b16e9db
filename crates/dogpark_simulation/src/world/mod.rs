//! Park world: headless oracles как ECS resources
//!
//! - NavMesh: walkable поверхность (trait object: engine bridge может подставить свою)
//! - CollisionWorld: сферические collider'ы акторов/препятствий для line-of-sight
//! - Collider: компонент актора, синхронизируется в CollisionWorld каждый tick

use bevy::prelude::*;

use crate::ai::oracles::{ColliderField, FlatNavMesh, LayerMask, NavMeshOracle, SphereCollider};

/// NavMesh projection oracle
#[derive(Resource)]
pub struct NavMesh(pub Box<dyn NavMeshOracle>);

impl NavMesh {
    pub fn new(oracle: impl NavMeshOracle + 'static) -> Self {
        Self(Box::new(oracle))
    }
}

impl Default for NavMesh {
    fn default() -> Self {
        Self::new(FlatNavMesh::square(50.0))
    }
}

/// Line-of-sight мир (статичные препятствия + акторы)
#[derive(Resource, Debug, Clone, Default)]
pub struct CollisionWorld {
    pub field: ColliderField,
}

/// Сферический collider актора (центр = Transform.translation)
#[derive(Component, Debug, Clone, Copy)]
pub struct Collider {
    pub radius: f32,
    pub layers: LayerMask,
}

impl Collider {
    pub fn sphere(radius: f32, layers: LayerMask) -> Self {
        Self { radius, layers }
    }
}

/// Статичное препятствие (стена, куст): спавнится как entity с Transform + Collider
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Obstacle;

/// Система: Transform + Collider → CollisionWorld
///
/// Despawned entities пропадают из field автоматически (пересобираем целиком).
pub fn sync_collision_world(
    colliders: Query<(Entity, &Transform, &Collider)>,
    mut world: ResMut<CollisionWorld>,
) {
    world.field.colliders.clear();
    for (entity, transform, collider) in colliders.iter() {
        world.field.colliders.push(SphereCollider {
            owner: entity,
            center: transform.translation,
            radius: collider.radius,
            layers: collider.layers,
        });
    }
}
