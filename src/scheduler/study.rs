use crate::core::MAX_TICK_GAP_MS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pause held at each study/break switch
pub const SWITCH_HOLD_MS: f64 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Study,
    Break,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Study => "study",
            Phase::Break => "break",
        })
    }
}

/// Alternating study and break countdown.
///
/// Counts down on every tick with the gap since the previous tick capped
/// at [`MAX_TICK_GAP_MS`]. On reaching zero it switches phase, reloads the
/// other duration, and holds for [`SWITCH_HOLD_MS`] before counting again.
#[derive(Debug, Clone)]
pub struct StudyTimer {
    phase: Phase,
    remaining_ms: f64,
    study_ms: f64,
    break_ms: f64,
    last_tick: Option<f64>,
    hold_until: Option<f64>,
}

impl StudyTimer {
    /// Durations in whole minutes; zero is raised to one
    pub fn new(study_min: u32, break_min: u32) -> Self {
        let study_ms = study_min.max(1) as f64 * 60_000.0;
        Self {
            phase: Phase::Study,
            remaining_ms: study_ms,
            study_ms,
            break_ms: break_min.max(1) as f64 * 60_000.0,
            last_tick: None,
            hold_until: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_ms(&self) -> f64 {
        self.remaining_ms.max(0.0)
    }

    /// Whole seconds shown on the face
    pub fn shown_seconds(&self) -> u64 {
        (self.remaining_ms() / 1000.0).floor() as u64
    }

    /// Share of the study phase done, 0..=1; 1 during breaks
    pub fn progress(&self) -> f32 {
        match self.phase {
            Phase::Study => (1.0 - self.remaining_ms / self.study_ms).clamp(0.0, 1.0) as f32,
            Phase::Break => 1.0,
        }
    }

    /// Advance to `now_ms`; returns the new phase when one began
    pub fn tick(&mut self, now_ms: f64) -> Option<Phase> {
        if let Some(until) = self.hold_until {
            if now_ms >= until {
                self.hold_until = None;
                self.last_tick = Some(now_ms);
            }
            return None;
        }

        let last = self.last_tick.unwrap_or(now_ms);
        self.remaining_ms -= (now_ms - last).clamp(0.0, MAX_TICK_GAP_MS);
        self.last_tick = Some(now_ms);
        if self.remaining_ms > 0.0 {
            return None;
        }

        (self.phase, self.remaining_ms) = match self.phase {
            Phase::Study => (Phase::Break, self.break_ms),
            Phase::Break => (Phase::Study, self.study_ms),
        };
        self.hold_until = Some(now_ms + SWITCH_HOLD_MS);
        Some(self.phase)
    }
}
