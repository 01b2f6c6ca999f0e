use glam::Vec2;

use super::Direction;
use crate::settings::{MovementMode, Settings};

/// Folds pointer, keyboard and nudge input into one direction plus a speed multiplier.
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    mode: MovementMode,
    pointer: Vec2,
    target: Option<Vec2>,
    arrived_radius: f32,
    deadzone: f32,
    gain: f32,
    max_distance: f32,
    curve: f32,
    last_distance: f32,
    held: HeldKeys,
}

#[derive(Debug, Clone, Copy, Default)]
struct HeldKeys {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl HeldKeys {
    fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    fn axis(&self) -> Vec2 {
        let x = (self.right as i32 - self.left as i32) as f32;
        let y = (self.down as i32 - self.up as i32) as f32;
        Vec2::new(x, y)
    }
}

impl InputNormalizer {
    pub fn new(settings: &Settings) -> Self {
        let mut input = Self {
            mode: MovementMode::Click,
            pointer: Vec2::ZERO,
            target: None,
            arrived_radius: 8.0,
            deadzone: 16.0,
            gain: 1.0,
            max_distance: 240.0,
            curve: 1.0,
            last_distance: 0.0,
            held: HeldKeys::default(),
        };
        input.apply_settings(settings);
        input
    }

    /// Take new tuning. Pointer position and any pending target are kept.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.mode = settings.movement_mode;
        self.arrived_radius = settings.click_arrive_radius.max(0.0);
        self.deadzone = settings.follow_deadzone.max(0.0);
        self.gain = settings.follow_gain.max(0.0);
        self.max_distance = settings.follow_max_dist.max(1.0);
        self.curve = settings.follow_curve.max(0.2);
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Pointer press in world coordinates. In click mode this sets a new destination.
    pub fn pointer_down(&mut self, pos: Vec2) {
        self.pointer = pos;
        if self.mode == MovementMode::Click {
            self.target = Some(pos);
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.pointer = pos;
    }

    pub fn set_key(&mut self, direction: Direction, down: bool) {
        match direction {
            Direction::Up => self.held.up = down,
            Direction::Down => self.held.down = down,
            Direction::Left => self.held.left = down,
            Direction::Right => self.held.right = down,
        }
    }

    /// Set a one-shot destination `distance` away from `origin`.
    /// Switches to click mode so the move ends on arrival.
    pub fn nudge_towards(&mut self, direction: Direction, distance: f32, origin: Vec2) {
        self.mode = MovementMode::Click;
        self.target = Some(origin + direction.vector() * distance);
    }

    /// Drop any pending destination. The mode is unchanged.
    pub fn stop(&mut self) {
        self.target = None;
    }

    /// Unit direction the player should move this step, or zero.
    pub fn move_vector(&mut self, player: Vec2) -> Vec2 {
        let mut dir = match self.mode {
            MovementMode::Click => {
                self.last_distance = 0.0;
                match self.target {
                    Some(target) => {
                        let delta = target - player;
                        if delta.length() <= self.arrived_radius {
                            self.target = None;
                            Vec2::ZERO
                        } else {
                            delta.normalize_or_zero()
                        }
                    }
                    None => Vec2::ZERO,
                }
            }
            MovementMode::Follow => {
                let delta = self.pointer - player;
                let dist = delta.length();
                self.last_distance = dist;
                if dist <= self.deadzone {
                    Vec2::ZERO
                } else {
                    delta.normalize_or_zero()
                }
            }
        };

        if self.held.any() {
            let keys = self.held.axis();
            if keys.x != 0.0 {
                dir.x = keys.x;
            }
            if keys.y != 0.0 {
                dir.y = keys.y;
            }
            dir = dir.normalize_or_zero();
        }
        dir
    }

    /// Speed scale for the last `move_vector` call, in `[0, gain]`.
    pub fn speed_multiplier(&self) -> f32 {
        match self.mode {
            MovementMode::Click => 1.0,
            MovementMode::Follow if self.held.any() => self.gain,
            MovementMode::Follow => {
                let span = self.max_distance.max(self.deadzone + 1.0) - self.deadzone;
                let t = ((self.last_distance - self.deadzone) / span).clamp(0.0, 1.0);
                self.gain * t.powf(self.curve)
            }
        }
    }
}
