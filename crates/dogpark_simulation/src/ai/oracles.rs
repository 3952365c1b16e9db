//! External world queries для AI (pose, NavMesh projection, raycast)
//!
//! AI не владеет физикой и pathfinding: только спрашивает:
//! - NavMeshOracle: "ближайшая walkable точка в радиусе" (аналог NavMesh.SamplePosition)
//! - ObstructionOracle: "кого первым заденет луч" (line-of-sight для vision cone)
//!
//! Headless реализации (FlatNavMesh, ColliderField) используются в тестах и demo binary.
//! Engine bridge подставляет свои реализации через те же traits.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Поза актора: позиция + forward вектор (world space)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Pose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            position: transform.translation,
            forward: *transform.forward(),
        }
    }
}

/// Битовая маска collision layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    pub const fn layer(index: u32) -> Self {
        LayerMask(1 << index)
    }

    /// Все layers кроме `mask`
    pub const fn all_except(mask: LayerMask) -> Self {
        LayerMask(!mask.0)
    }

    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

/// Collision layers для headless мира
pub mod layers {
    use super::LayerMask;

    /// Стены, заборы, кусты
    pub const ENVIRONMENT: LayerMask = LayerMask::layer(0);
    /// Игрок
    pub const PLAYER: LayerMask = LayerMask::layer(1);
    /// Собаки
    pub const DOGS: LayerMask = LayerMask::layer(2);
}

/// NavMesh projection: ближайшая walkable точка в пределах `radius` от `point`
pub trait NavMeshOracle: Send + Sync {
    fn project(&self, point: Vec3, radius: f32) -> Option<Vec3>;
}

/// Raycast: первый collider вдоль луча (не считая layers из `ignore`)
///
/// `direction` должен быть normalized. Возвращает Entity владельца collider'а.
pub trait ObstructionOracle: Send + Sync {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        ignore: LayerMask,
    ) -> Option<Entity>;
}

/// Прямоугольная walkable плоскость (XZ bounds, фиксированная высота)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatNavMesh {
    pub min: Vec2,
    pub max: Vec2,
    pub height: f32,
}

impl FlatNavMesh {
    pub fn new(min: Vec2, max: Vec2, height: f32) -> Self {
        Self { min, max, height }
    }

    /// Квадратная площадка `half_extent` во все стороны от origin
    pub fn square(half_extent: f32) -> Self {
        Self::new(Vec2::splat(-half_extent), Vec2::splat(half_extent), 0.0)
    }
}

impl NavMeshOracle for FlatNavMesh {
    fn project(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        let clamped = Vec2::new(point.x, point.z).clamp(self.min, self.max);
        let projected = Vec3::new(clamped.x, self.height, clamped.y);

        (projected.distance(point) <= radius).then_some(projected)
    }
}

/// Сферический collider (владелец + layers)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCollider {
    pub owner: Entity,
    pub center: Vec3,
    pub radius: f32,
    pub layers: LayerMask,
}

/// Набор сферических collider'ов (headless raycast)
///
/// Как и engine raycast: collider, внутри которого стартует луч, не детектится
/// (собака не "видит" саму себя).
#[derive(Debug, Clone, Default)]
pub struct ColliderField {
    pub colliders: Vec<SphereCollider>,
}

impl ColliderField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collider: SphereCollider) {
        self.colliders.retain(|c| c.owner != collider.owner);
        self.colliders.push(collider);
    }

    fn hit_distance(collider: &SphereCollider, origin: Vec3, direction: Vec3) -> Option<f32> {
        let oc = origin - collider.center;
        let c = oc.length_squared() - collider.radius * collider.radius;
        if c <= 0.0 {
            // Луч стартует внутри collider'а
            return None;
        }

        let b = oc.dot(direction);
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let t = -b - discriminant.sqrt();
        (t >= 0.0).then_some(t)
    }
}

impl ObstructionOracle for ColliderField {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        ignore: LayerMask,
    ) -> Option<Entity> {
        let direction = direction.try_normalize()?;

        self.colliders
            .iter()
            .filter(|c| !c.layers.intersects(ignore))
            .filter_map(|c| Self::hit_distance(c, origin, direction).map(|t| (t, c.owner)))
            .filter(|(t, _)| *t <= max_distance)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, owner)| owner)
    }
}
