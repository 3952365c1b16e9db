//! Movement компоненты: команды перемещения и поворота, скорость

use bevy::prelude::*;

/// Команда движения для актора (выполняет внешний locomotion executor)
///
/// Архитектура:
/// - AI пишет MovementCommand (high-level intent, уже спроецированный на NavMesh)
/// - Locomotion читает и двигает Transform / NavigationAgent
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub enum MovementCommand {
    /// Цели нет (ещё ничего не выбрано): стоим
    #[default]
    Idle,
    /// Двигаться к позиции (world coordinates, walkable)
    MoveToPosition { target: Vec3 },
    /// Сбросить путь и стоять на месте
    Stop,
}

impl MovementCommand {
    pub fn target(&self) -> Option<Vec3> {
        match self {
            MovementCommand::MoveToPosition { target } => Some(*target),
            MovementCommand::Idle | MovementCommand::Stop => None,
        }
    }
}

/// Команда поворота (yaw only: собаки не наклоняются)
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub enum FacingCommand {
    #[default]
    Hold,
    /// Повернуться к точке (высота точки игнорируется)
    LookAt { point: Vec3 },
    /// Повернуться на угол вокруг Y (градусы, + = против часовой)
    Turn { degrees: f32 },
}

/// Скорость движения актора (метры/сек)
#[derive(Component, Clone, Copy, Debug)]
pub struct MovementSpeed {
    pub speed: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self { speed: 3.5 }
    }
}
