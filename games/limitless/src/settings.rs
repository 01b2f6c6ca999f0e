//! Player-facing options and the difficulty/stage tuning derived from them.
//!
//! The UI owns these values. The game only reads a snapshot, replaced whole on each
//! settings change.

use limitless_engine::{from_json_lenient, load_lenient, KeyValueStore};
use serde::{Deserialize, Serialize};

pub const SETTINGS_KEY: &str = "limitless:settings:v1";

/// How pointer input steers the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementMode {
    /// Click a point; walk there and stop.
    #[default]
    Click,
    /// Continuously steer toward the pointer.
    Follow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Relaxed,
    #[default]
    Standard,
    Intense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    #[default]
    Default,
    High,
    Mono,
}

/// Snapshot of every recognized option. Durations are milliseconds, distances world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub movement_mode: MovementMode,
    pub high_contrast: bool,
    pub text_scale: u32,
    pub scan_mode: bool,
    pub scan_interval: f32,
    pub dwell_enabled: bool,
    pub dwell_time: f32,
    pub follow_deadzone: f32,
    pub follow_gain: f32,
    pub follow_max_dist: f32,
    pub follow_curve: f32,
    pub click_arrive_radius: f32,
    pub face_tilt_sensitivity: f32,
    pub face_nudge_distance: f32,
    pub face_repeat_ms: f32,
    pub telegraph_ms: f32,
    pub telegraph_bold: bool,
    pub projectile_bold: bool,
    pub screen_shake: bool,
    pub palette: Palette,
    pub difficulty: Difficulty,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            movement_mode: MovementMode::Click,
            high_contrast: false,
            text_scale: 100,
            scan_mode: false,
            scan_interval: 1200.0,
            dwell_enabled: false,
            dwell_time: 900.0,
            follow_deadzone: 16.0,
            follow_gain: 1.0,
            follow_max_dist: 240.0,
            follow_curve: 1.0,
            click_arrive_radius: 8.0,
            face_tilt_sensitivity: 0.06,
            face_nudge_distance: 160.0,
            face_repeat_ms: 300.0,
            telegraph_ms: 200.0,
            telegraph_bold: false,
            projectile_bold: false,
            screen_shake: true,
            palette: Palette::Default,
            difficulty: Difficulty::Standard,
        }
    }
}

impl Settings {
    /// Parse a settings payload. Bad fields keep their defaults.
    pub fn from_json(json: &str) -> Self {
        from_json_lenient::<Settings>(json).sanitized()
    }

    /// Read the snapshot the settings UI last saved.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        load_lenient::<Settings>(store, SETTINGS_KEY).sanitized()
    }

    /// Clamp values into ranges the game can use.
    pub fn sanitized(mut self) -> Self {
        self.follow_deadzone = finite_or(self.follow_deadzone, 16.0).max(0.0);
        self.follow_gain = finite_or(self.follow_gain, 1.0).clamp(0.0, 3.0);
        self.follow_max_dist = finite_or(self.follow_max_dist, 240.0).max(1.0);
        self.follow_curve = finite_or(self.follow_curve, 1.0).max(0.2);
        self.click_arrive_radius = finite_or(self.click_arrive_radius, 8.0).max(1.0);
        self.face_tilt_sensitivity = finite_or(self.face_tilt_sensitivity, 0.06).max(0.005);
        self.face_nudge_distance = finite_or(self.face_nudge_distance, 160.0).max(1.0);
        self.face_repeat_ms = finite_or(self.face_repeat_ms, 300.0).max(50.0);
        self.scan_interval = finite_or(self.scan_interval, 1200.0).max(200.0);
        self.dwell_time = finite_or(self.dwell_time, 900.0).max(200.0);
        self.telegraph_ms = finite_or(self.telegraph_ms, 200.0).clamp(0.0, 2000.0);
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Numeric tuning for one difficulty at one stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    pub spawn_delay_ms: f32,
    pub enemy_speed_mul: f32,
    pub hp_mul: f32,
    pub bullet_speed_mul: f32,
    pub telegraph_scale: f32,
    pub damage_to_player: u32,
}

impl DifficultyProfile {
    /// Stage-1 values for a preset.
    pub fn preset(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Relaxed => Self {
                spawn_delay_ms: 2200.0,
                enemy_speed_mul: 0.85,
                hp_mul: 0.85,
                bullet_speed_mul: 0.9,
                telegraph_scale: 1.2,
                damage_to_player: 1,
            },
            Difficulty::Standard => Self {
                spawn_delay_ms: 1500.0,
                enemy_speed_mul: 1.0,
                hp_mul: 1.0,
                bullet_speed_mul: 1.0,
                telegraph_scale: 1.0,
                damage_to_player: 1,
            },
            Difficulty::Intense => Self {
                spawn_delay_ms: 1000.0,
                enemy_speed_mul: 1.2,
                hp_mul: 1.15,
                bullet_speed_mul: 1.15,
                telegraph_scale: 0.85,
                damage_to_player: 2,
            },
        }
    }

    /// Preset scaled for `stage`: faster enemies and denser spawns as stages climb.
    pub fn for_stage(difficulty: Difficulty, stage: u32) -> Self {
        let mut profile = Self::preset(difficulty);
        let step = stage.max(1) - 1;
        profile.enemy_speed_mul *= 1.0 + step as f32 * 0.08;
        profile.spawn_delay_ms = (profile.spawn_delay_ms - step as f32 * 120.0).max(700.0);
        profile
    }

    /// Telegraph length after difficulty scaling.
    pub fn telegraph_ms(&self, settings: &Settings) -> f32 {
        settings.telegraph_ms * self.telegraph_scale
    }
}

/// Planned run length for a stage, in seconds.
pub fn planned_run_seconds(stage: u32) -> u32 {
    (90 + (stage.max(1) - 1) * 15).min(180)
}

#[cfg(test)]
mod tests {
    use super::*;
    use limitless_engine::MemoryStore;

    #[test]
    fn partial_payload_keeps_other_defaults() {
        let s = Settings::from_json(r#"{"movementMode":"follow","followGain":1.5}"#);
        assert_eq!(s.movement_mode, MovementMode::Follow);
        assert_eq!(s.follow_gain, 1.5);
        assert_eq!(s.follow_deadzone, 16.0);
        assert_eq!(s.difficulty, Difficulty::Standard);
    }

    #[test]
    fn bad_values_are_rejected_per_field() {
        let s = Settings::from_json(
            r#"{"difficulty":"nightmare","followCurve":0.01,"followMaxDist":"far","scanMode":true}"#,
        );
        assert_eq!(s.difficulty, Difficulty::Standard);
        assert_eq!(s.follow_curve, 0.2);
        assert_eq!(s.follow_max_dist, 240.0);
        assert!(s.scan_mode);
    }

    #[test]
    fn load_reads_store() {
        let mut store = MemoryStore::new();
        store.set(SETTINGS_KEY, r#"{"difficulty":"intense"}"#);
        assert_eq!(Settings::load(&store).difficulty, Difficulty::Intense);
        assert_eq!(Settings::load(&MemoryStore::new()), Settings::default());
    }

    #[test]
    fn stage_scaling() {
        let p = DifficultyProfile::for_stage(Difficulty::Standard, 3);
        assert!((p.enemy_speed_mul - 1.16).abs() < 1e-5);
        assert_eq!(p.spawn_delay_ms, 1260.0);
        let p = DifficultyProfile::for_stage(Difficulty::Intense, 9);
        assert_eq!(p.spawn_delay_ms, 700.0);
    }

    #[test]
    fn run_length_grows_then_caps() {
        assert_eq!(planned_run_seconds(1), 90);
        assert_eq!(planned_run_seconds(3), 120);
        assert_eq!(planned_run_seconds(20), 180);
    }

    #[test]
    fn telegraph_follows_difficulty() {
        let s = Settings::default();
        let relaxed = DifficultyProfile::preset(Difficulty::Relaxed).telegraph_ms(&s);
        let intense = DifficultyProfile::preset(Difficulty::Intense).telegraph_ms(&s);
        assert!(relaxed > intense);
    }
}
