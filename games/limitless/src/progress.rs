//! Persisted records: stage progress, stage rewards, the carried build, tutorial flag.

use limitless_engine::{from_json_lenient, load_lenient, save_json, KeyValueStore};
use serde::{Deserialize, Serialize};

use crate::build::PlayerBuild;

pub const PROGRESS_KEY: &str = "limitless:progress:v1";
pub const REWARDS_KEY: &str = "limitless:rewards:v1";
pub const BUILD_KEY: &str = "limitless:runstate:v1";
pub const TUTORIAL_KEY: &str = "limitless:tutorialSeen";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_stage: u32,
    pub highest_unlocked: u32,
    pub tokens: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            current_stage: 1,
            highest_unlocked: 1,
            tokens: 0,
        }
    }
}

/// Tokens needed to open the stage after `stage`.
pub fn unlock_cost(stage: u32) -> u32 {
    (3 + (stage.max(1) - 1) * 2).min(20)
}

/// Tokens paid out for a successful run.
pub fn tokens_for_run(kills: u32) -> u32 {
    kills / 10 + 2
}

impl Progress {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut progress: Progress = load_lenient(store, PROGRESS_KEY);
        progress.highest_unlocked = progress.highest_unlocked.max(1);
        progress.current_stage = progress.current_stage.clamp(1, progress.highest_unlocked);
        progress
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        if let Err(err) = save_json(store, PROGRESS_KEY, self) {
            log::warn!("failed to save progress: {err}");
        }
    }

    /// Bank a successful run on `stage` and open the next stage if affordable.
    /// Returns the tokens earned.
    pub fn record_success(&mut self, stage: u32, kills: u32) -> u32 {
        let earned = tokens_for_run(kills);
        self.tokens += earned;
        let next = stage + 1;
        if next > self.highest_unlocked {
            let cost = unlock_cost(stage);
            if self.tokens >= cost {
                self.tokens -= cost;
                self.highest_unlocked = next;
                log::info!("stage {next} unlocked");
            }
        }
        earned
    }

    pub fn is_unlocked(&self, stage: u32) -> bool {
        stage >= 1 && stage <= self.highest_unlocked
    }
}

/// Abilities earned by clearing stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rewards {
    pub magnet: bool,
    pub blast: bool,
}

impl Rewards {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        load_lenient(store, REWARDS_KEY)
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        if let Err(err) = save_json(store, REWARDS_KEY, self) {
            log::warn!("failed to save rewards: {err}");
        }
    }

    /// Unlock the reward tied to clearing `stage`. Returns true if something new was granted.
    pub fn grant_for_stage(&mut self, stage: u32) -> bool {
        match stage {
            1 if !self.magnet => {
                self.magnet = true;
                true
            }
            2 if !self.blast => {
                self.blast = true;
                true
            }
            _ => false,
        }
    }
}

/// Read the build carried over from the previous stage, if one was exported.
pub fn load_build(store: &dyn KeyValueStore) -> Option<PlayerBuild> {
    let json = store.get(BUILD_KEY)?;
    let mut build: PlayerBuild = from_json_lenient(&json);
    build.sanitize();
    Some(build)
}

pub fn save_build(store: &mut dyn KeyValueStore, build: &PlayerBuild) {
    if let Err(err) = save_json(store, BUILD_KEY, build) {
        log::warn!("failed to export build: {err}");
    }
}

pub fn clear_build(store: &mut dyn KeyValueStore) {
    store.remove(BUILD_KEY);
}

pub fn tutorial_seen(store: &dyn KeyValueStore) -> bool {
    store.get(TUTORIAL_KEY).as_deref() == Some("1")
}

pub fn mark_tutorial_seen(store: &mut dyn KeyValueStore) {
    store.set(TUTORIAL_KEY, "1");
}
