//! Accessible input: pointer/keyboard normalization plus face and voice adapters.
//!
//! Every modality ends up as either a movement intent on [`InputNormalizer`] or a
//! discrete [`Command`] consumed by the run on the next step.

pub mod gesture;
pub mod normalizer;
pub mod voice;

pub use gesture::{tilt_direction, FaceSample, GestureBridge};
pub use normalizer::InputNormalizer;
pub use voice::parse_transcript;

use glam::Vec2;
use serde::Serialize;

use crate::settings::{Difficulty, MovementMode};

/// A cardinal direction. Screen space: +y points down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn vector(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// Decode the wire code used by custom move events.
    pub fn from_code(code: u32) -> Option<Direction> {
        match code {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Settings changes a voice user can ask for. The settings UI carries them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum UiAction {
    OpenSettings,
    CloseSettings,
    ToggleContrast,
    ToggleScan,
    SetDifficulty(Difficulty),
    SetMovement(MovementMode),
}

/// A discrete command from an assistive source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Stop,
    /// Zero-based choice in the open overlay.
    Select(usize),
    Ui(UiAction),
}
