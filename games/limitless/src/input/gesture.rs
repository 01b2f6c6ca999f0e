//! Face-tilt control.
//!
//! The host runs landmark detection and sends three measurements per camera frame.
//! Here they become a held direction, and while a direction is held the bridge issues
//! a nudge every `face_repeat_ms`.

use limitless_engine::Timer;

use super::Direction;
use crate::settings::Settings;

/// Measurements from one face-landmark frame (landmarks 33, 263 and 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSample {
    /// Left-eye y minus right-eye y.
    pub eye_slope: f32,
    /// Right-eye x minus left-eye x.
    pub eye_span: f32,
    /// Mid-eye y minus nose y.
    pub nose_offset: f32,
}

/// Map a head pose to a direction. Roll wins over pitch.
pub fn tilt_direction(sample: FaceSample, sensitivity: f32) -> Option<Direction> {
    let tilt = sample.eye_slope / sample.eye_span.abs().max(1e-4);
    if tilt > sensitivity {
        return Some(Direction::Left);
    }
    if tilt < -sensitivity {
        return Some(Direction::Right);
    }
    let pitch = 0.75 * sensitivity;
    if sample.nose_offset > pitch {
        Some(Direction::Down)
    } else if sample.nose_offset < -pitch {
        Some(Direction::Up)
    } else {
        None
    }
}

/// Turns face samples into repeated nudge directions.
#[derive(Debug, Clone)]
pub struct GestureBridge {
    direction: Option<Direction>,
    repeater: Timer,
    sensitivity: f32,
    nudge_distance: f32,
}

impl GestureBridge {
    pub fn new(settings: &Settings) -> Self {
        Self {
            direction: None,
            repeater: Timer::repeating(settings.face_repeat_ms),
            sensitivity: settings.face_tilt_sensitivity,
            nudge_distance: settings.face_nudge_distance,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.sensitivity = settings.face_tilt_sensitivity;
        self.nudge_distance = settings.face_nudge_distance;
        self.repeater.set_delay(settings.face_repeat_ms);
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn nudge_distance(&self) -> f32 {
        self.nudge_distance
    }

    /// Feed a new frame. Returns the new direction when it changed.
    pub fn observe(&mut self, sample: FaceSample) -> Option<Option<Direction>> {
        self.set_direction(tilt_direction(sample, self.sensitivity))
    }

    /// The face left the camera view.
    pub fn lost(&mut self) -> Option<Option<Direction>> {
        self.set_direction(None)
    }

    fn set_direction(&mut self, direction: Option<Direction>) -> Option<Option<Direction>> {
        if direction == self.direction {
            return None;
        }
        self.direction = direction;
        self.repeater.reset();
        Some(direction)
    }

    /// Advance the repeater by real time. Returns a direction for each nudge due.
    pub fn tick(&mut self, dt_ms: f32) -> Option<Direction> {
        let direction = self.direction?;
        // Several periods in one long frame still produce a single nudge
        (self.repeater.tick(dt_ms) > 0).then_some(direction)
    }
}
