//! Perception: vision cone + hearing → DetectionLevel
//!
//! Два канала восприятия:
//! 1. Vision (poll каждый tick): угол к цели < FOV/2, дистанция ≤ view_distance,
//!    raycast первым попадает в цель → Panic (перебивает всё)
//! 2. Hearing (push от SoundChannel): шаг ближе hearing_radius/2 → Panic,
//!    ближе hearing_radius → Alert. Память edge-triggered: detect() читает и сбрасывает.
//!
//! Память слуха только эскалирует: слабый звук не перетирает непрочитанный Panic.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::oracles::{layers, LayerMask, ObstructionOracle, Pose};
use super::sound::{EmitterId, SoundChannel, SoundEvent, SoundListener, SoundSubscription};

/// Результат восприятия
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DetectionLevel {
    #[default]
    None = 0,
    /// Что-то слышно вдалеке → искать
    Alert = 1,
    /// Увидели или услышали вплотную → бежать
    Panic = 2,
}

impl DetectionLevel {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => DetectionLevel::None,
            1 => DetectionLevel::Alert,
            _ => DetectionLevel::Panic,
        }
    }
}

/// Параметры восприятия
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionConfig {
    /// Полный угол vision cone (градусы)
    pub view_angle: f32,
    /// Дальность зрения (метры)
    pub view_distance: f32,
    /// Радиус слуха (метры). Ближе половины радиуса → Panic
    pub hearing_radius: f32,
    /// Layers которые луч видимости пропускает насквозь
    pub obstruction_mask: LayerMask,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            view_angle: 60.0,
            view_distance: 10.0,
            hearing_radius: 10.0,
            // Другие собаки не закрывают обзор
            obstruction_mask: layers::DOGS,
        }
    }
}

/// "Ухо" собаки: то что живёт в SoundChannel как listener
///
/// Shared между PerceptionUnit и каналом (Arc). Позицию обновляет владелец каждый tick.
#[derive(Debug)]
pub struct Hearing {
    position: Mutex<Vec3>,
    heard: AtomicU8,
    hearing_radius: f32,
}

impl Hearing {
    fn new(position: Vec3, hearing_radius: f32) -> Self {
        Self {
            position: Mutex::new(position),
            heard: AtomicU8::new(DetectionLevel::None as u8),
            hearing_radius,
        }
    }

    fn position(&self) -> Vec3 {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_position(&self, position: Vec3) {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = position;
    }

    fn peek(&self) -> DetectionLevel {
        DetectionLevel::from_u8(self.heard.load(Ordering::Acquire))
    }

    fn take(&self) -> DetectionLevel {
        DetectionLevel::from_u8(self.heard.swap(DetectionLevel::None as u8, Ordering::AcqRel))
    }
}

impl SoundListener for Hearing {
    fn on_sound(&self, event: &SoundEvent) {
        // Crouch: шаги не слышно
        if event.quiet {
            return;
        }

        let distance = self.position().distance(event.position);
        let level = if distance < self.hearing_radius / 2.0 {
            DetectionLevel::Panic
        } else if distance < self.hearing_radius {
            DetectionLevel::Alert
        } else {
            return;
        };

        // fetch_max: Alert не понижает непрочитанный Panic
        self.heard.fetch_max(level as u8, Ordering::AcqRel);
    }
}

/// Perception одной собаки (vision + hearing memory + подписка на цель)
#[derive(Debug)]
pub struct PerceptionUnit {
    config: PerceptionConfig,
    hearing: Arc<Hearing>,
    target: Option<EmitterId>,
    subscription: Option<SoundSubscription>,
}

impl PerceptionUnit {
    pub fn new(config: PerceptionConfig, position: Vec3) -> Self {
        let hearing = Arc::new(Hearing::new(position, config.hearing_radius));
        Self {
            config,
            hearing,
            target: None,
            subscription: None,
        }
    }

    /// Начать следить за целью: vision проверяет её, hearing подписан на её шаги
    ///
    /// Предыдущая подписка (если была) снимается: в каждый момент одна цель.
    pub fn track(&mut self, channel: &SoundChannel, target: EmitterId) {
        self.subscription = None;
        let listener: Arc<dyn SoundListener> = self.hearing.clone();
        self.subscription = Some(channel.subscribe(target, listener));
        self.target = Some(target);
    }

    /// Перестать слушать цель (teardown). Возвращает true если подписка была активна.
    pub fn stop_tracking(&mut self) -> bool {
        self.target = None;
        self.subscription
            .take()
            .map(SoundSubscription::unsubscribe)
            .unwrap_or(false)
    }

    pub fn target(&self) -> Option<EmitterId> {
        self.target
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().is_some_and(SoundSubscription::is_active)
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// Позиция для расчёта дистанции до звуков
    pub fn set_position(&self, position: Vec3) {
        self.hearing.set_position(position);
    }

    /// Sound handler (то же что вызывает SoundChannel)
    pub fn hear(&self, event: &SoundEvent) {
        self.hearing.on_sound(event);
    }

    /// Текущая память слуха без сброса
    pub fn heard_level(&self) -> DetectionLevel {
        self.hearing.peek()
    }

    /// Забыть непрочитанные звуки (reset собаки)
    pub fn clear_memory(&self) {
        self.hearing.take();
    }

    /// Главная проверка (каждый tick)
    ///
    /// Vision → Panic, память слуха не трогаем (непрочитанный звук ждёт следующей проверки).
    /// Иначе читаем память слуха и сбрасываем её.
    pub fn detect(&self, agent: Pose, target: Pose, obstruction: &dyn ObstructionOracle) -> DetectionLevel {
        if self.can_see(agent, target, obstruction) {
            return DetectionLevel::Panic;
        }

        self.hearing.take()
    }

    /// Vision cone + line-of-sight
    pub fn can_see(&self, agent: Pose, target: Pose, obstruction: &dyn ObstructionOracle) -> bool {
        let Some(target_entity) = self.target else {
            return false;
        };

        let to_target = target.position - agent.position;
        if to_target.length() > self.config.view_distance {
            return false;
        }

        // Цель стоит вплотную (в той же точке): считаем что видим
        let Some(direction) = to_target.try_normalize() else {
            return true;
        };
        let Some(forward) = agent.forward.try_normalize() else {
            return false;
        };

        let angle = forward.angle_between(direction).to_degrees();
        if angle >= self.config.view_angle / 2.0 {
            return false;
        }

        obstruction.raycast(
            agent.position,
            direction,
            self.config.view_distance,
            self.config.obstruction_mask,
        ) == Some(target_entity)
    }
}
