//! Idle-zone directory: общий read-only список мест отдыха

use bevy::prelude::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectoryError {
    #[error("idle-zone directory is empty")]
    Empty,

    #[error("no idle zone other than {excluded} is available")]
    NoEligibleZone { excluded: Vec3 },
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Места отдыха (задаются сценой, AI только читает)
#[derive(Resource, Debug, Clone, Default)]
pub struct IdleZoneDirectory {
    zones: Vec<Vec3>,
}

impl IdleZoneDirectory {
    pub fn new(zones: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            zones: zones.into_iter().collect(),
        }
    }

    pub fn zones(&self) -> &[Vec3] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Ближайшая зона к `position`, кроме `excluding` (предыдущий выбор)
    ///
    /// Линейный проход; при равной дистанции выигрывает зона раньше в списке.
    pub fn nearest(&self, position: Vec3, excluding: Option<Vec3>) -> DirectoryResult<Vec3> {
        if self.zones.is_empty() {
            return Err(DirectoryError::Empty);
        }

        let mut best: Option<(f32, Vec3)> = None;
        for &zone in &self.zones {
            if Some(zone) == excluding {
                continue;
            }

            let distance = position.distance(zone);
            if best.map_or(true, |(shortest, _)| distance < shortest) {
                best = Some((distance, zone));
            }
        }

        match (best, excluding) {
            (Some((_, zone)), _) => Ok(zone),
            (None, Some(excluded)) => Err(DirectoryError::NoEligibleZone { excluded }),
            // Не пустой список без исключения всегда даёт результат
            (None, None) => Err(DirectoryError::Empty),
        }
    }
}
