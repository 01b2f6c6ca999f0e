//! Wire vocabulary shared with the TypeScript host.
//!
//! Numeric ids travel through the shared buffer (sounds, FX events, sprite kinds) or the
//! custom-event channel. Notices travel as JSON through the outbox.

use limitless_engine::SoundEvent;
use serde::Serialize;

use crate::build::UpgradeKind;
use crate::input::{Direction, UiAction};
use crate::scan::Overlay;

// Sound cues (Rust → audio)
pub const SOUND_SHOOT: SoundEvent = SoundEvent(1);
pub const SOUND_PICKUP: SoundEvent = SoundEvent(2);
pub const SOUND_BLAST: SoundEvent = SoundEvent(3);
pub const SOUND_ENEMY_HIT: SoundEvent = SoundEvent(4);
pub const SOUND_PLAYER_HURT: SoundEvent = SoundEvent(5);
pub const SOUND_CLICK: SoundEvent = SoundEvent(6);
pub const SOUND_LEVEL_UP: SoundEvent = SoundEvent(7);
pub const SOUND_BOSS_SPAWN: SoundEvent = SoundEvent(8);
pub const SOUND_BOSS_DEATH: SoundEvent = SoundEvent(9);
pub const SOUND_STATIC: SoundEvent = SoundEvent(10);
pub const SOUND_TELEGRAPH: SoundEvent = SoundEvent(11);

// FX event kinds (Rust → renderer). Payload noted per kind.
/// a=x, b=y, c=telegraph duration ms
pub const FX_TELEGRAPH_RING: f32 = 1.0;
/// a=x, b=y, c=bearing radians
pub const FX_TELEGRAPH_ARC: f32 = 2.0;
/// a=x, b=y, c=bearing radians
pub const FX_TELEGRAPH_LINE: f32 = 3.0;
/// a=x, b=y
pub const FX_HIT: f32 = 4.0;
/// a=x, b=y, c=radius
pub const FX_BLAST: f32 = 5.0;
/// a=x, b=y, c=radius
pub const FX_STATIC_PULSE: f32 = 6.0;
/// a=x, b=y, c=burst index
pub const FX_BOSS_BURST: f32 = 7.0;
/// a=x, b=y
pub const FX_CLICK_MARKER: f32 = 8.0;
/// a=duration ms, b=intensity
pub const FX_SHAKE: f32 = 9.0;

// Sprite kinds for the instance snapshot
pub const SPRITE_PLAYER: f32 = 0.0;
/// Plus the archetype index.
pub const SPRITE_ENEMY_BASE: f32 = 10.0;
pub const SPRITE_PROJECTILE: f32 = 20.0;
pub const SPRITE_ENEMY_BULLET: f32 = 21.0;
pub const SPRITE_XP_ORB: f32 = 22.0;
pub const SPRITE_DRONE: f32 = 23.0;
pub const SPRITE_BOSS: f32 = 30.0;

// Custom event kinds (UI → Rust)
/// a = zero-based choice index
pub const CUSTOM_SELECT: u32 = 1;
pub const CUSTOM_PAUSE: u32 = 2;
pub const CUSTOM_RESUME: u32 = 3;
pub const CUSTOM_TUTORIAL_PRACTICE: u32 = 4;
pub const CUSTOM_TUTORIAL_PLAY: u32 = 5;
pub const CUSTOM_RETRY: u32 = 6;
pub const CUSTOM_NEXT_STAGE: u32 = 7;
pub const CUSTOM_START_REAL_RUN: u32 = 8;
/// a = eye-line slope, b = eye span, c = nose offset
pub const CUSTOM_FACE_SAMPLE: u32 = 9;
pub const CUSTOM_FACE_LOST: u32 = 10;
/// a = direction code (0 up, 1 down, 2 left, 3 right)
pub const CUSTOM_MOVE: u32 = 11;
pub const CUSTOM_STOP: u32 = 12;
pub const CUSTOM_SCAN_ACTIVATE: u32 = 13;
/// a = stage number
pub const CUSTOM_START_PRACTICE: u32 = 14;

// Text event kinds (UI → Rust)
pub const TEXT_SETTINGS: u32 = 1;
pub const TEXT_VOICE: u32 = 2;

// Key codes
pub const KEY_ENTER: u32 = 13;
pub const KEY_ESCAPE: u32 = 27;
pub const KEY_SPACE: u32 = 32;
pub const KEY_LEFT: u32 = 37;
pub const KEY_UP: u32 = 38;
pub const KEY_RIGHT: u32 = 39;
pub const KEY_DOWN: u32 = 40;
pub const KEY_1: u32 = 49;
pub const KEY_2: u32 = 50;
pub const KEY_3: u32 = 51;
pub const KEY_P: u32 = 80;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// Survived the countdown or defeated the boss.
    Time,
    Defeat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub kind: UpgradeKind,
    pub label: &'static str,
    /// Times this upgrade was already taken.
    pub level: u32,
}

/// Notifications for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Notice {
    RunOver {
        reason: EndReason,
        stage: u32,
        survived: u32,
        level: u32,
        kills: u32,
        tokens_earned: u32,
        next_stage_unlocked: bool,
    },
    LevelUpOffered {
        level: u32,
        choices: Vec<Choice>,
    },
    UpgradeApplied {
        kind: UpgradeKind,
        level: u32,
    },
    PauseOpened,
    Resumed,
    /// The player asked to leave for the stage menu.
    MenuRequested,
    Practice {
        active: bool,
    },
    Hint {
        text: &'static str,
    },
    ScanFocus {
        overlay: Overlay,
        index: usize,
    },
    FaceDirection {
        direction: Option<Direction>,
    },
    UiRequest {
        action: UiAction,
    },
    BossSpawned {
        hp: u32,
    },
    Hud {
        hp: u32,
        max_hp: u32,
        level: u32,
        xp: u32,
        xp_to_next: u32,
        remaining: u32,
        kills: u32,
        boss_hp: Option<u32>,
        boss_max_hp: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_are_tagged_camel_case() {
        let json = serde_json::to_string(&Notice::RunOver {
            reason: EndReason::Time,
            stage: 2,
            survived: 105,
            level: 6,
            kills: 40,
            tokens_earned: 6,
            next_stage_unlocked: true,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"runOver","reason":"time","stage":2,"survived":105,"level":6,"kills":40,"tokensEarned":6,"nextStageUnlocked":true}"#
        );
    }

    #[test]
    fn unit_notices_carry_only_type() {
        let json = serde_json::to_string(&Notice::PauseOpened).unwrap();
        assert_eq!(json, r#"{"type":"pauseOpened"}"#);
    }
}
