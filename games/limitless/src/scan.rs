//! Single-switch access to the overlays: focus steps through the items on a timer and
//! a key press (or dwelling on one item) activates it.

use limitless_engine::Timer;
use serde::Serialize;

use crate::settings::Settings;

/// Overlays that take focus while the run is suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Overlay {
    /// Upgrade choices.
    LevelUp,
    /// Resume, settings.
    Pause,
    /// Next stage (when unlocked), retry, menu.
    RunOver,
}

/// What one tick of the controller did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanTick {
    /// New focus index after an automatic step.
    pub moved: Option<usize>,
    /// Index activated by dwelling.
    pub activated: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ScanController {
    scan_mode: bool,
    dwell_enabled: bool,
    step: Timer,
    dwell: Timer,
    count: usize,
    focus: usize,
}

impl ScanController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            scan_mode: settings.scan_mode,
            dwell_enabled: settings.dwell_enabled,
            step: Timer::repeating(settings.scan_interval),
            dwell: Timer::once(settings.dwell_time),
            count: 0,
            focus: 0,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.scan_mode = settings.scan_mode;
        self.dwell_enabled = settings.dwell_enabled;
        self.step.set_delay(settings.scan_interval);
        self.dwell = Timer::once(settings.dwell_time);
    }

    pub fn is_enabled(&self) -> bool {
        self.scan_mode
    }

    pub fn is_open(&self) -> bool {
        self.count > 0
    }

    /// Focused index while an overlay is open.
    pub fn focus(&self) -> Option<usize> {
        self.is_open().then_some(self.focus)
    }

    /// Start traversal over `count` items, focused on the first.
    pub fn open(&mut self, count: usize) {
        self.count = count;
        self.focus = 0;
        self.step.reset();
        self.dwell.reset();
    }

    pub fn close(&mut self) {
        self.count = 0;
        self.focus = 0;
    }

    /// Advance real time. Nothing cycles unless scan mode is on.
    pub fn tick(&mut self, dt_ms: f32) -> ScanTick {
        let mut out = ScanTick::default();
        if !self.scan_mode || self.count == 0 {
            return out;
        }
        let steps = self.step.tick(dt_ms) as usize;
        if steps > 0 {
            self.focus = (self.focus + steps) % self.count;
            self.dwell.reset();
            out.moved = Some(self.focus);
            return out;
        }
        if self.dwell_enabled && self.dwell.tick(dt_ms) > 0 {
            out.activated = Some(self.focus);
        }
        out
    }

    /// Switch press: the focused index.
    pub fn activate(&self) -> Option<usize> {
        self.focus()
    }
}
