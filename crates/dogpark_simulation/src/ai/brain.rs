//! DogBrain: state machine одной собаки
//!
//! Явный `tick(ctx, delta)` вместо бесконечного цикла с yield:
//! все многокадровые ожидания (поиск): накопленное время в SearchState.
//!
//! Порядок tick'а:
//! 1. Caught? → pin в Caught (perception больше не влияет)
//! 2. Иначе detection: Panic → Fleeing (из любого состояния), Alert → AlertSearching (если не бежим)
//! 3. Поведение текущего состояния (rest spot / поиск / бегство / следование)
//!
//! NavMesh miss: не ошибка: warning + повтор на следующем tick'е.
//! Пустой idle-zone directory: BrainError наружу (логирует вызывающий).

use bevy::prelude::*;
use rand::{Rng, RngCore};
use thiserror::Error;

use super::components::{DogConfig, DogState, SearchState};
use super::idle_zones::{DirectoryError, IdleZoneDirectory};
use super::oracles::{NavMeshOracle, ObstructionOracle, Pose};
use super::perception::{DetectionLevel, PerceptionUnit};
use crate::components::{FacingCommand, MovementCommand};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrainError {
    #[error("dog {agent:?} at {position} could not pick a rest spot: {source}")]
    RestSpot {
        agent: Entity,
        position: Vec3,
        #[source]
        source: DirectoryError,
    },
}

pub type BrainResult<T> = Result<T, BrainError>;

/// Зачем проецировали точку на NavMesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPurpose {
    RestSpot,
    Flee,
    FollowCatcher,
}

/// NavMesh projection не нашла walkable точку (recoverable)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("dog {agent:?} at {position}: no walkable point within {radius} of {attempted} ({purpose:?})")]
pub struct NavigationMiss {
    pub agent: Entity,
    pub position: Vec3,
    pub attempted: Vec3,
    pub radius: f32,
    pub purpose: NavigationPurpose,
}

/// Итог одного tick'а
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Состояние в начале tick'а
    pub previous: DogState,
    /// Состояние после tick'а
    pub state: DogState,
    pub detection: DetectionLevel,
    pub navigation_miss: Option<NavigationMiss>,
}

impl TickReport {
    pub fn changed(&self) -> bool {
        self.previous != self.state
    }
}

/// Всё что собаке нужно от мира на один tick
pub struct TickContext<'a> {
    /// Своя поза
    pub pose: Pose,
    /// Поза игрока (угроза / тот за кем следуем)
    pub threat: Pose,
    pub navmesh: &'a dyn NavMeshOracle,
    pub obstruction: &'a dyn ObstructionOracle,
    pub zones: &'a IdleZoneDirectory,
    pub rng: &'a mut dyn RngCore,
}

/// State machine собаки (владеет perception через композицию)
#[derive(Component, Debug)]
pub struct DogBrain {
    agent: Entity,
    config: DogConfig,
    perception: PerceptionUnit,
    state: DogState,
    chosen_rest_spot: Option<Vec3>,
    prev_rest_spot: Option<Vec3>,
    flee_destination: Option<Vec3>,
    captured: bool,
    rest_spot_decided: bool,
    /// Угроза замечена заново: нужно перестроить путь бегства
    threat_fresh: bool,
    search: SearchState,
    movement: MovementCommand,
    facing: FacingCommand,
}

impl DogBrain {
    pub fn new(agent: Entity, config: DogConfig, perception: PerceptionUnit) -> Self {
        Self {
            agent,
            config,
            perception,
            state: DogState::default(),
            chosen_rest_spot: None,
            prev_rest_spot: None,
            flee_destination: None,
            captured: false,
            rest_spot_decided: false,
            threat_fresh: false,
            search: SearchState::default(),
            movement: MovementCommand::Idle,
            facing: FacingCommand::Hold,
        }
    }

    pub fn agent(&self) -> Entity {
        self.agent
    }

    pub fn config(&self) -> &DogConfig {
        &self.config
    }

    pub fn current_state(&self) -> DogState {
        self.state
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Последняя закоммиченная команда движения (читает locomotion)
    pub fn movement_command(&self) -> MovementCommand {
        self.movement
    }

    /// Поворот, запрошенный на последнем tick'е
    pub fn facing(&self) -> FacingCommand {
        self.facing
    }

    pub fn rest_spot_decided(&self) -> bool {
        self.rest_spot_decided
    }

    pub fn chosen_rest_spot(&self) -> Option<Vec3> {
        self.chosen_rest_spot
    }

    pub fn prev_rest_spot(&self) -> Option<Vec3> {
        self.prev_rest_spot
    }

    pub fn flee_destination(&self) -> Option<Vec3> {
        self.flee_destination
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn perception(&self) -> &PerceptionUnit {
        &self.perception
    }

    pub fn perception_mut(&mut self) -> &mut PerceptionUnit {
        &mut self.perception
    }

    /// Собаку поймали (вызывает interaction/catch система). Необратимо до reset().
    pub fn notify_captured(&mut self) {
        if !self.captured {
            self.captured = true;
            crate::logger::log_info(&format!("🐕 {:?} captured (was {})", self.agent, self.state.as_str()));
        }
    }

    /// Внешний reset (новый раунд): всё в начальное состояние, подписка сохраняется
    pub fn reset(&mut self) {
        self.state = DogState::default();
        self.chosen_rest_spot = None;
        self.prev_rest_spot = None;
        self.flee_destination = None;
        self.captured = false;
        self.rest_spot_decided = false;
        self.threat_fresh = false;
        self.search = SearchState::default();
        self.movement = MovementCommand::Idle;
        self.facing = FacingCommand::Hold;
        self.perception.clear_memory();
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>, delta: f32) -> BrainResult<TickReport> {
        let previous = self.state;
        let mut report = TickReport {
            previous,
            state: previous,
            detection: DetectionLevel::None,
            navigation_miss: None,
        };

        self.facing = FacingCommand::Hold;
        self.perception.set_position(ctx.pose.position);

        if self.captured {
            self.transition_to(DogState::Caught, &mut *ctx.rng);
        } else {
            report.detection = self.perception.detect(ctx.pose, ctx.threat, ctx.obstruction);
            match report.detection {
                DetectionLevel::Panic => {
                    // Из Fleeing: просто перестраиваем путь
                    self.threat_fresh = true;
                    self.search.elapsed = 0.0;
                    self.transition_to(DogState::Fleeing, &mut *ctx.rng);
                }
                DetectionLevel::Alert if self.state != DogState::Fleeing => {
                    self.transition_to(DogState::AlertSearching, &mut *ctx.rng);
                }
                DetectionLevel::Alert | DetectionLevel::None => {}
            }
        }

        let outcome = match self.state {
            // Idle: хуки анимаций/звуков снаружи
            DogState::IdleDigging | DogState::IdleHiding | DogState::IdleSleeping => Ok(()),
            DogState::PatrolFindingRestSpot => self.patrol_step(ctx, &mut report),
            DogState::AlertSearching => {
                self.search_step(ctx, delta);
                Ok(())
            }
            DogState::Fleeing => {
                self.flee_step(ctx, &mut report);
                Ok(())
            }
            DogState::Caught => {
                self.caught_step(ctx, &mut report);
                Ok(())
            }
        };

        report.state = self.state;
        outcome.map(|()| report)
    }

    /// Смена состояния + entry actions
    ///
    /// Повторный вход в текущее состояние: no-op (таймеры не сбрасываются).
    fn transition_to(&mut self, next: DogState, rng: &mut dyn RngCore) {
        if self.state == next {
            return;
        }

        crate::logger::log(&format!(
            "🐕 {:?} {} → {}",
            self.agent,
            self.state.as_str(),
            next.as_str()
        ));

        // Цель отдыха живёт только внутри PatrolFindingRestSpot
        self.rest_spot_decided = false;
        self.state = next;

        match next {
            DogState::AlertSearching => {
                let (min, max) = (self.config.search_duration_min, self.config.search_duration_max);
                let duration = if max > min { rng.gen_range(min..=max) } else { min };
                self.search = SearchState::begin(duration);
            }
            DogState::Fleeing => {
                self.flee_destination = None;
            }
            DogState::Caught => {
                self.movement = MovementCommand::Stop;
            }
            DogState::PatrolFindingRestSpot
            | DogState::IdleDigging
            | DogState::IdleHiding
            | DogState::IdleSleeping => {}
        }
    }

    fn navigation_miss(&self, position: Vec3, attempted: Vec3, purpose: NavigationPurpose) -> NavigationMiss {
        let miss = NavigationMiss {
            agent: self.agent,
            position,
            attempted,
            radius: self.config.navmesh_sample_radius,
            purpose,
        };
        crate::logger::log_warning(&format!("⚠️ {}, retry next tick", miss));
        miss
    }

    fn patrol_step(&mut self, ctx: &mut TickContext<'_>, report: &mut TickReport) -> BrainResult<()> {
        let position = ctx.pose.position;

        if !self.rest_spot_decided {
            let zone = ctx
                .zones
                .nearest(position, self.prev_rest_spot)
                .map_err(|source| BrainError::RestSpot {
                    agent: self.agent,
                    position,
                    source,
                })?;

            // Разброс по XZ: высоту даёт NavMesh
            let jitter = self.config.rest_spot_jitter;
            let offset = if jitter > 0.0 {
                Vec3::new(ctx.rng.gen_range(-jitter..=jitter), 0.0, ctx.rng.gen_range(-jitter..=jitter))
            } else {
                Vec3::ZERO
            };
            let candidate = zone + offset;

            match ctx.navmesh.project(candidate, self.config.navmesh_sample_radius) {
                Some(spot) => {
                    self.chosen_rest_spot = Some(spot);
                    self.prev_rest_spot = Some(zone);
                    self.rest_spot_decided = true;
                    self.movement = MovementCommand::MoveToPosition { target: spot };
                    crate::logger::log(&format!(
                        "🦴 {:?} heading to rest spot {} (zone {})",
                        self.agent, spot, zone
                    ));
                }
                None => {
                    report.navigation_miss = Some(self.navigation_miss(position, candidate, NavigationPurpose::RestSpot));
                }
            }
        }

        let Some(spot) = self.chosen_rest_spot.filter(|_| self.rest_spot_decided) else {
            return Ok(());
        };

        self.facing = FacingCommand::LookAt { point: spot };

        if position.distance(spot) < self.config.arrival_distance {
            let idle = DogState::IDLE[ctx.rng.gen_range(0..DogState::IDLE.len())];
            self.transition_to(idle, &mut *ctx.rng);
        }

        Ok(())
    }

    fn search_step(&mut self, ctx: &mut TickContext<'_>, delta: f32) {
        // Стоим на месте пока ищем
        self.movement = MovementCommand::Stop;

        let degrees = self.search.advance(
            delta,
            self.config.search_rotation_speed,
            self.config.max_search_rotation,
        );
        self.facing = FacingCommand::Turn { degrees };

        if self.search.is_finished() {
            self.search.elapsed = 0.0;
            self.transition_to(DogState::PatrolFindingRestSpot, &mut *ctx.rng);
        }
    }

    fn flee_step(&mut self, ctx: &mut TickContext<'_>, report: &mut TickReport) {
        let position = ctx.pose.position;

        if self.threat_fresh {
            // От игрока; если стоим в одной точке: назад от взгляда
            let direction = (position - ctx.threat.position)
                .try_normalize()
                .or_else(|| (-ctx.pose.forward).try_normalize())
                .unwrap_or(Vec3::X);
            let candidate = position + direction * self.config.flee_distance;

            match ctx.navmesh.project(candidate, self.config.navmesh_sample_radius) {
                Some(destination) => {
                    self.flee_destination = Some(destination);
                    self.movement = MovementCommand::MoveToPosition { target: destination };
                    self.threat_fresh = false;
                }
                None => {
                    report.navigation_miss = Some(self.navigation_miss(position, candidate, NavigationPurpose::Flee));
                }
            }
        }

        let Some(destination) = self.flee_destination else {
            return;
        };

        self.facing = FacingCommand::LookAt { point: destination };

        if position.distance(destination) < self.config.arrival_distance {
            self.transition_to(DogState::PatrolFindingRestSpot, &mut *ctx.rng);
        }
    }

    fn caught_step(&mut self, ctx: &mut TickContext<'_>, report: &mut TickReport) {
        let position = ctx.pose.position;
        let catcher = ctx.threat.position;

        // Держимся на поводке: догоняем только если отстали
        if position.distance(catcher) <= self.config.caught_follow_leash {
            if self.movement != MovementCommand::Stop {
                self.movement = MovementCommand::Stop;
            }
            return;
        }

        match ctx.navmesh.project(catcher, self.config.navmesh_sample_radius) {
            Some(target) => {
                self.movement = MovementCommand::MoveToPosition { target };
            }
            None => {
                report.navigation_miss = Some(self.navigation_miss(position, catcher, NavigationPurpose::FollowCatcher));
            }
        }
    }
}
