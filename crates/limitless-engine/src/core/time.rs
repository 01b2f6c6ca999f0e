/// Fixed timestep accumulator.
/// Ensures game logic runs at a consistent rate regardless of frame time.
pub struct FixedTimestep {
    /// The fixed delta time per tick.
    dt: f32,
    /// Accumulated time from variable frame deltas.
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt;
        // Cap to prevent spiral of death (max 10 steps per frame)
        self.accumulator = self.accumulator.min(self.dt * 10.0);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// Interpolation alpha for rendering between ticks (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    /// The fixed delta time.
    pub fn dt(&self) -> f32 {
        self.dt
    }
}

/// Monotonic gameplay clock in milliseconds.
/// Stands still while paused, so timestamps taken from it survive a pause unchanged.
#[derive(Debug, Clone, Default)]
pub struct SceneClock {
    now_ms: f64,
    paused: bool,
}

impl SceneClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt_ms` unless paused. Returns the time actually advanced.
    pub fn advance(&mut self, dt_ms: f32) -> f32 {
        if self.paused {
            return 0.0;
        }
        self.now_ms += dt_ms as f64;
        dt_ms
    }

    /// Current scene time in milliseconds.
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

/// A scheduled callback evaluated against scene time.
/// The owner polls `tick` with the elapsed scene time and runs its callback once per firing.
#[derive(Debug, Clone)]
pub struct Timer {
    delay_ms: f32,
    elapsed_ms: f32,
    repeat: bool,
    paused: bool,
    finished: bool,
}

impl Timer {
    /// Fires once after `delay_ms`.
    pub fn once(delay_ms: f32) -> Self {
        Self::build(delay_ms, false)
    }

    /// Fires every `delay_ms`.
    pub fn repeating(delay_ms: f32) -> Self {
        Self::build(delay_ms, true)
    }

    fn build(delay_ms: f32, repeat: bool) -> Self {
        Self {
            delay_ms: delay_ms.max(1.0),
            elapsed_ms: 0.0,
            repeat,
            paused: false,
            finished: false,
        }
    }

    /// Advance by `dt_ms`. Returns the number of firings in this interval.
    pub fn tick(&mut self, dt_ms: f32) -> u32 {
        if self.paused || self.finished {
            return 0;
        }
        self.elapsed_ms += dt_ms;
        if !self.repeat {
            if self.elapsed_ms >= self.delay_ms {
                self.finished = true;
                return 1;
            }
            return 0;
        }
        let mut fired = 0;
        while self.elapsed_ms >= self.delay_ms {
            self.elapsed_ms -= self.delay_ms;
            fired += 1;
        }
        fired
    }

    /// Freeze or thaw the timer. Remaining delay is preserved exactly.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether a one-shot timer has already fired.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn delay(&self) -> f32 {
        self.delay_ms
    }

    /// Time until the next firing.
    pub fn remaining(&self) -> f32 {
        (self.delay_ms - self.elapsed_ms).max(0.0)
    }

    /// Change the period. Progress already made toward the next firing is kept,
    /// capped at the new period.
    pub fn set_delay(&mut self, delay_ms: f32) {
        self.delay_ms = delay_ms.max(1.0);
        self.elapsed_ms = self.elapsed_ms.min(self.delay_ms);
    }

    /// Restart the countdown from zero.
    pub fn reset(&mut self) {
        self.elapsed_ms = 0.0;
        self.finished = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        let steps = ts.accumulate(1.0 / 60.0);
        assert_eq!(steps, 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        let steps = ts.accumulate(0.008);
        assert_eq!(steps, 0);
        let steps = ts.accumulate(0.010);
        assert_eq!(steps, 1);
    }

    #[test]
    fn caps_at_ten_steps() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        let steps = ts.accumulate(1.0);
        assert_eq!(steps, 10);
    }

    #[test]
    fn clock_stands_still_while_paused() {
        let mut clock = SceneClock::new();
        clock.advance(100.0);
        clock.pause();
        assert_eq!(clock.advance(500.0), 0.0);
        clock.resume();
        clock.advance(50.0);
        assert_eq!(clock.now(), 150.0);
    }

    #[test]
    fn repeating_timer_fires_per_period() {
        let mut t = Timer::repeating(100.0);
        assert_eq!(t.tick(99.0), 0);
        assert_eq!(t.tick(1.0), 1);
        assert_eq!(t.tick(250.0), 2);
        assert_eq!(t.remaining(), 50.0);
    }

    #[test]
    fn once_timer_fires_once() {
        let mut t = Timer::once(300.0);
        assert_eq!(t.tick(400.0), 1);
        assert_eq!(t.tick(400.0), 0);
        assert!(t.is_finished());
    }

    #[test]
    fn pause_preserves_remaining_delay() {
        let mut t = Timer::repeating(1000.0);
        t.tick(400.0);
        t.set_paused(true);
        for _ in 0..100 {
            assert_eq!(t.tick(16.0), 0);
        }
        t.set_paused(false);
        assert_eq!(t.remaining(), 600.0);
        assert_eq!(t.tick(599.0), 0);
        assert_eq!(t.tick(1.0), 1);
    }

    #[test]
    fn set_delay_caps_progress() {
        let mut t = Timer::repeating(800.0);
        t.tick(700.0);
        t.set_delay(640.0);
        assert_eq!(t.tick(0.0), 1);
    }
}
