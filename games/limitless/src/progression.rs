//! XP, level-ups and the upgrade choice that suspends the run.

use limitless_engine::Rng;

use crate::build::{PlayerBuild, UpgradeKind};
use crate::events::Choice;

const OFFER_SIZE: usize = 3;

/// Tracks level-ups waiting for a choice.
///
/// While an offer is open the run is suspended; only [`ProgressionEngine::resolve`]
/// with a valid index closes it. There is no timeout and no cancel.
#[derive(Debug, Default)]
pub struct ProgressionEngine {
    /// Level-ups earned but not yet offered.
    pending: u32,
    offer: Option<Vec<UpgradeKind>>,
}

impl ProgressionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add XP to the build and queue any level-ups it earns.
    pub fn gain_xp(&mut self, build: &mut PlayerBuild, amount: u32) -> u32 {
        let levels = build.add_xp(amount);
        if levels > 0 {
            log::debug!("level {} reached ({} queued)", build.level, self.pending + levels);
        }
        self.pending += levels;
        levels
    }

    /// Whether a level-up is waiting to be offered.
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    pub fn is_awaiting_choice(&self) -> bool {
        self.offer.is_some()
    }

    pub fn offer(&self) -> Option<&[UpgradeKind]> {
        self.offer.as_deref()
    }

    /// Open the next queued level-up: shuffle the available catalog and keep up to three.
    pub fn open_offer(&mut self, build: &PlayerBuild, rng: &mut Rng) -> Option<Vec<Choice>> {
        if self.offer.is_some() || self.pending == 0 {
            return None;
        }
        let mut pool: Vec<UpgradeKind> = UpgradeKind::ALL
            .into_iter()
            .filter(|kind| kind.is_available(build))
            .collect();
        rng.shuffle(&mut pool);
        pool.truncate(OFFER_SIZE);
        if pool.is_empty() {
            log::warn!("no upgrades available; skipping level-up");
            self.pending -= 1;
            return None;
        }
        self.pending -= 1;
        let choices = pool
            .iter()
            .map(|&kind| Choice {
                kind,
                label: kind.label(),
                level: build.upgrade_level(kind),
            })
            .collect();
        self.offer = Some(pool);
        Some(choices)
    }

    /// Apply the chosen upgrade and restore full HP. `None` leaves the offer open.
    pub fn resolve(&mut self, build: &mut PlayerBuild, index: usize) -> Option<UpgradeKind> {
        let kind = *self.offer.as_ref()?.get(index)?;
        self.offer = None;
        build.apply(kind);
        build.heal_full();
        log::info!("upgrade chosen: {}", kind.label());
        Some(kind)
    }

    /// Forget any queued or open level-up.
    pub fn reset(&mut self) {
        self.pending = 0;
        self.offer = None;
    }
}
