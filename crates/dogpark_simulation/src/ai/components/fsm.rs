//! FSM AI components (состояния собаки, конфиг, таймер поиска).

use serde::{Deserialize, Serialize};

/// Состояния собаки
///
/// Ровно одно активное. Caught: sticky: выходит только через внешний reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DogState {
    IdleDigging,
    IdleHiding,
    IdleSleeping,
    /// Начальное состояние: идём к месту отдыха
    #[default]
    PatrolFindingRestSpot,
    /// Услышали что-то: стоим и крутим головой
    AlertSearching,
    /// Убегаем от игрока
    Fleeing,
    /// Пойманы: ходим за игроком
    Caught,
}

impl DogState {
    /// Idle варианты (выбираются случайно по прибытии на место отдыха)
    pub const IDLE: [DogState; 3] = [DogState::IdleDigging, DogState::IdleHiding, DogState::IdleSleeping];

    pub const ALL: [DogState; 7] = [
        DogState::IdleDigging,
        DogState::IdleHiding,
        DogState::IdleSleeping,
        DogState::PatrolFindingRestSpot,
        DogState::AlertSearching,
        DogState::Fleeing,
        DogState::Caught,
    ];

    pub fn is_idle(&self) -> bool {
        Self::IDLE.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DogState::IdleDigging => "IdleDigging",
            DogState::IdleHiding => "IdleHiding",
            DogState::IdleSleeping => "IdleSleeping",
            DogState::PatrolFindingRestSpot => "PatrolFindingRestSpot",
            DogState::AlertSearching => "AlertSearching",
            DogState::Fleeing => "Fleeing",
            DogState::Caught => "Caught",
        }
    }
}

/// Параметры поведения собаки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DogConfig {
    /// Ближе этого: "пришли" (rest spot / flee destination), метры
    pub arrival_distance: f32,
    /// Случайный разброс вокруг idle zone (чтобы собаки не сбивались в кучу), метры
    pub rest_spot_jitter: f32,
    /// Радиус поиска walkable точки при NavMesh projection, метры
    pub navmesh_sample_radius: f32,
    /// Как далеко убегать от игрока, метры
    pub flee_distance: f32,
    /// AlertSearching длится случайно в [min, max] секунд
    pub search_duration_min: f32,
    pub search_duration_max: f32,
    /// Скорость поворота головы при поиске (градусы/сек)
    pub search_rotation_speed: f32,
    /// После стольких градусов в одну сторону: разворот
    pub max_search_rotation: f32,
    /// Пойманная собака догоняет игрока если отстала дальше этого, метры
    pub caught_follow_leash: f32,
}

impl Default for DogConfig {
    fn default() -> Self {
        Self {
            arrival_distance: 5.0,
            rest_spot_jitter: 10.0,
            navmesh_sample_radius: 15.0,
            flee_distance: 15.0,
            search_duration_min: 3.0,
            search_duration_max: 6.0,
            search_rotation_speed: 35.0,
            max_search_rotation: 180.0,
            caught_follow_leash: 10.0,
        }
    }
}

/// Таймер + вращение AlertSearching (сбрасывается при входе в состояние)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    /// Сколько уже ищем (секунды)
    pub elapsed: f32,
    /// Сколько искать в этот раз (секунды)
    pub target_duration: f32,
    /// Накопленный поворот в текущую сторону (градусы, со знаком)
    pub rotation_accumulated: f32,
    /// +1 / -1
    pub rotation_sign: f32,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::begin(0.0)
    }
}

impl SearchState {
    pub fn begin(target_duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            target_duration,
            rotation_accumulated: 0.0,
            rotation_sign: 1.0,
        }
    }

    /// Один tick поиска. Возвращает поворот за этот tick (градусы).
    ///
    /// Как только |накопленный| ≥ max_rotation: меняем сторону и копим заново с нуля.
    pub fn advance(&mut self, delta: f32, rotation_speed: f32, max_rotation: f32) -> f32 {
        let rotation = rotation_speed * delta * self.rotation_sign;
        self.rotation_accumulated += rotation;

        if self.rotation_accumulated.abs() >= max_rotation.abs() {
            self.rotation_sign = -self.rotation_sign;
            self.rotation_accumulated = 0.0;
        }

        self.elapsed += delta;
        rotation
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.target_duration
    }
}
