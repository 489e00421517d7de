/// Self-contained timers - manage internal state from timestamps in ms.
/// Each loop owns its timers; cancelling a loop drops them.

/// Fixed period timer - fires once per elapsed interval
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    pub interval_ms: f64,
    pub accumulator: f64,
}

impl FixedInterval {
    /// Create timer firing every `interval_ms`
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(1.0),
            accumulator: 0.0,
        }
    }

    /// Create timer that fires at given frequency
    pub fn from_hz(hz: f64) -> Self {
        Self::new(1000.0 / hz.max(f64::EPSILON))
    }

    /// Update with delta, returns true if should fire.
    /// A long stall fires once rather than bursting to catch up.
    pub fn tick(&mut self, delta_ms: f64) -> bool {
        self.accumulator += delta_ms;

        if self.accumulator >= self.interval_ms {
            self.accumulator = (self.accumulator - self.interval_ms) % self.interval_ms;
            true
        } else {
            false
        }
    }
}

/// Throttled timer - minimum interval between fires, first fire immediate
#[derive(Debug, Clone, Copy)]
pub struct Throttled {
    min_interval_ms: f64,
    last_fire: Option<f64>,
}

impl Throttled {
    /// Create throttled timer with minimum interval
    pub fn new(min_interval_ms: f64) -> Self {
        Self {
            min_interval_ms,
            last_fire: None,
        }
    }

    /// Attempt to fire at `now_ms`, returns true if enough time has passed
    pub fn try_fire(&mut self, now_ms: f64) -> bool {
        match self.last_fire {
            Some(last) if now_ms - last < self.min_interval_ms => false,
            _ => {
                self.last_fire = Some(now_ms);
                true
            }
        }
    }
}

/// Longest gap one `PlaybackClock` tick may account for
pub const MAX_TICK_GAP_MS: f64 = 1000.0;

/// Wall-time to whole-step converter for one animated mode.
///
/// Keeps the last timestamp and the sub-step remainder so the step rate is
/// independent of how often `advance` is called.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackClock {
    last_ts: Option<f64>,
    acc_ms: f64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tick, returns elapsed ms since the previous one.
    /// The first tick only anchors the clock; a stall counts as at most
    /// `MAX_TICK_GAP_MS`.
    pub fn advance(&mut self, now_ms: f64) -> f64 {
        let dt = match self.last_ts {
            Some(last) => (now_ms - last).clamp(0.0, MAX_TICK_GAP_MS),
            None => 0.0,
        };
        self.last_ts = Some(now_ms);
        self.acc_ms += dt;
        dt
    }

    /// Consume as many whole `step_ms` as have accumulated
    pub fn take_steps(&mut self, step_ms: f64) -> u64 {
        if step_ms <= 0.0 {
            return 0;
        }
        let steps = (self.acc_ms / step_ms).floor();
        self.acc_ms -= steps * step_ms;
        steps as u64
    }

    /// Leftover time not yet converted into steps
    pub fn remainder_ms(&self) -> f64 {
        self.acc_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_interval_fires_at_rate() {
        let mut timer = FixedInterval::from_hz(60.0);

        assert!(!timer.tick(10.0));
        assert!(timer.tick(10.0));
        assert!(!timer.tick(1.0));
    }

    #[test]
    fn fixed_interval_does_not_burst_after_stall() {
        let mut timer = FixedInterval::new(100.0);
        assert!(timer.tick(1050.0));
        assert!(!timer.tick(10.0));
        assert!(timer.tick(45.0));
    }

    #[test]
    fn throttled_enforces_minimum() {
        let mut timer = Throttled::new(1000.0);

        assert!(timer.try_fire(0.0));
        assert!(!timer.try_fire(500.0));
        assert!(timer.try_fire(1000.0));
        assert!(!timer.try_fire(1999.9));
    }

    #[test]
    fn playback_clock_carries_remainder() {
        let mut clock = PlaybackClock::new();
        assert_eq!(clock.advance(100.0), 0.0);

        clock.advance(125.0);
        assert_eq!(clock.take_steps(10.0), 2);
        assert!((clock.remainder_ms() - 5.0).abs() < 1e-9);

        clock.advance(130.0);
        assert_eq!(clock.take_steps(10.0), 1);
        assert!(clock.remainder_ms().abs() < 1e-9);
    }

    #[test]
    fn playback_clock_ignores_time_going_backwards() {
        let mut clock = PlaybackClock::new();
        clock.advance(50.0);
        assert_eq!(clock.advance(40.0), 0.0);
        assert_eq!(clock.take_steps(1.0), 0);
    }

    #[test]
    fn playback_clock_caps_a_stall() {
        let mut clock = PlaybackClock::new();
        clock.advance(0.0);
        assert_eq!(clock.advance(60_000.0), MAX_TICK_GAP_MS);
        assert_eq!(clock.take_steps(10.0), 100);
        clock.advance(60_016.0);
        assert_eq!(clock.take_steps(16.0), 1);
    }
}
