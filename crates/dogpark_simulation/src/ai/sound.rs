//! Sound channel: broadcast шагов от emitter'а к подписанным слушателям
//!
//! Архитектура:
//! - Emitter (игрок) публикует позицию каждый раз когда шумит
//! - PerceptionUnit подписывается на КОНКРЕТНЫЙ emitter
//! - Доставка синхронная: publish() возвращается только после того как все
//!   текущие подписчики получили событие
//!
//! Подписка: scoped resource: `SoundSubscription` guard отписывает в Drop.
//! Слушатель не может получить событие после того как его владелец уничтожен.

use bevy::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Кто издаёт звук (игрок = Entity)
pub type EmitterId = Entity;

/// Звук от emitter'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundEvent {
    /// Где прозвучал шаг (world space)
    pub position: Vec3,
    /// Emitter в тихой позе (crouch): слушатели игнорируют
    pub quiet: bool,
}

impl SoundEvent {
    pub fn footstep(position: Vec3, quiet: bool) -> Self {
        Self { position, quiet }
    }
}

/// Подписчик канала
pub trait SoundListener: Send + Sync {
    fn on_sound(&self, event: &SoundEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    listener: Arc<dyn SoundListener>,
}

#[derive(Default)]
struct ChannelInner {
    next_id: u64,
    listeners: HashMap<EmitterId, Vec<Registration>>,
}

impl ChannelInner {
    fn remove(&mut self, emitter: EmitterId, id: ListenerId) -> bool {
        let Some(registrations) = self.listeners.get_mut(&emitter) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;

        if registrations.is_empty() {
            self.listeners.remove(&emitter);
        }

        removed
    }
}

fn lock(inner: &Mutex<ChannelInner>) -> MutexGuard<'_, ChannelInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sound channel resource (cheap clone: общий handle)
#[derive(Resource, Clone, Default)]
pub struct SoundChannel {
    inner: Arc<Mutex<ChannelInner>>,
}

impl SoundChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Подписать listener на звуки `emitter`
    ///
    /// Подписка живёт пока жив возвращённый guard.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, emitter: EmitterId, listener: Arc<dyn SoundListener>) -> SoundSubscription {
        let mut inner = lock(&self.inner);
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner
            .listeners
            .entry(emitter)
            .or_default()
            .push(Registration { id, listener });

        crate::logger::log(&format!("🔔 SoundChannel: listener {:?} subscribed to emitter {:?}", id, emitter));

        SoundSubscription {
            channel: Arc::downgrade(&self.inner),
            emitter,
            id,
            active: true,
        }
    }

    /// Разослать событие всем подписчикам `emitter`
    ///
    /// Возвращает количество уведомлённых слушателей.
    /// Lock отпускаем ДО вызова слушателей (listener может сам publish/unsubscribe).
    pub fn publish(&self, emitter: EmitterId, event: SoundEvent) -> usize {
        let listeners: Vec<Arc<dyn SoundListener>> = lock(&self.inner)
            .listeners
            .get(&emitter)
            .map(|registrations| registrations.iter().map(|r| Arc::clone(&r.listener)).collect())
            .unwrap_or_default();

        for listener in &listeners {
            listener.on_sound(&event);
        }

        listeners.len()
    }

    pub fn listener_count(&self, emitter: EmitterId) -> usize {
        lock(&self.inner).listeners.get(&emitter).map_or(0, Vec::len)
    }
}

impl fmt::Debug for SoundChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("SoundChannel")
            .field("emitters", &inner.listeners.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}

/// Scoped подписка: Drop → unsubscribe
pub struct SoundSubscription {
    channel: Weak<Mutex<ChannelInner>>,
    emitter: EmitterId,
    id: ListenerId,
    active: bool,
}

impl SoundSubscription {
    pub fn emitter(&self) -> EmitterId {
        self.emitter
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active && self.channel.strong_count() > 0
    }

    /// Явная отписка (то же самое делает Drop)
    ///
    /// Возвращает true если listener реально был в канале.
    pub fn unsubscribe(mut self) -> bool {
        self.revoke()
    }

    fn revoke(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;

        // Канал уже уничтожен: отписываться не от кого
        let Some(inner) = self.channel.upgrade() else {
            return false;
        };

        let removed = lock(&inner).remove(self.emitter, self.id);
        if removed {
            crate::logger::log(&format!(
                "🔕 SoundChannel: listener {:?} unsubscribed from emitter {:?}",
                self.id, self.emitter
            ));
        }
        removed
    }
}

impl Drop for SoundSubscription {
    fn drop(&mut self) {
        self.revoke();
    }
}

impl fmt::Debug for SoundSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundSubscription")
            .field("emitter", &self.emitter)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
