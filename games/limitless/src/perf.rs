//! Frame-rate watchdog that eases spawn pressure on slow devices.

const WINDOW_MS: f32 = 2000.0;
const LOW_FPS: f32 = 45.0;
const RECOVER_FPS: f32 = 55.0;
pub const SPAWN_DELAY_STEP_MS: f32 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerfMode {
    #[default]
    Normal,
    Low,
}

/// Mode switch reported at the end of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerfChange {
    EnteredLow,
    Recovered,
}

impl PerfChange {
    /// New spawn delay after this switch.
    pub fn adjust_delay(self, current: f32, base: f32) -> f32 {
        match self {
            PerfChange::EnteredLow => current + SPAWN_DELAY_STEP_MS,
            PerfChange::Recovered => (current - SPAWN_DELAY_STEP_MS).max(base),
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            PerfChange::EnteredLow => "Performance mode: fewer enemies",
            PerfChange::Recovered => "Performance restored",
        }
    }
}

/// Counts rendered frames over fixed windows.
#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    frames: u32,
    elapsed_ms: f32,
    mode: PerfMode,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> PerfMode {
        self.mode
    }

    /// Record one rendered frame of `frame_ms`. The two thresholds leave a band
    /// where the mode holds.
    pub fn sample(&mut self, frame_ms: f32) -> Option<PerfChange> {
        self.frames += 1;
        self.elapsed_ms += frame_ms.max(0.0);
        if self.elapsed_ms < WINDOW_MS {
            return None;
        }
        let fps = self.frames as f32 * 1000.0 / self.elapsed_ms;
        self.frames = 0;
        self.elapsed_ms = 0.0;
        match self.mode {
            PerfMode::Normal if fps < LOW_FPS => {
                self.mode = PerfMode::Low;
                log::info!("low frame rate ({fps:.0} fps); easing spawns");
                Some(PerfChange::EnteredLow)
            }
            PerfMode::Low if fps > RECOVER_FPS => {
                self.mode = PerfMode::Normal;
                log::info!("frame rate recovered ({fps:.0} fps)");
                Some(PerfChange::Recovered)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(monitor: &mut PerformanceMonitor, frame_ms: f32, frames: u32) -> Vec<PerfChange> {
        (0..frames).filter_map(|_| monitor.sample(frame_ms)).collect()
    }

    #[test]
    fn slow_window_enters_low_mode_once() {
        let mut m = PerformanceMonitor::new();
        // 25 fps for three windows
        assert_eq!(run(&mut m, 40.0, 150), vec![PerfChange::EnteredLow]);
        assert_eq!(m.mode(), PerfMode::Low);
    }

    #[test]
    fn band_between_thresholds_holds_mode() {
        let mut m = PerformanceMonitor::new();
        run(&mut m, 40.0, 50);
        // 50 fps sits between the thresholds
        assert!(run(&mut m, 20.0, 300).is_empty());
        // 62.5 fps
        assert_eq!(run(&mut m, 16.0, 125), vec![PerfChange::Recovered]);
    }

    #[test]
    fn recovery_never_undercuts_base_delay() {
        assert_eq!(PerfChange::EnteredLow.adjust_delay(1500.0, 1500.0), 2100.0);
        assert_eq!(PerfChange::Recovered.adjust_delay(1800.0, 1500.0), 1500.0);
    }
}
