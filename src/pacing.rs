//! Pacing controller: spawn interval and per-cell fall delay.

use crate::board::Board;
use std::time::Duration;

/// The fall delay is this fraction of the spawn interval.
const DROP_DELAY_DIVISOR: u32 = 5;

/// A resting tile waits three quarters of the drop delay before its final match check.
const SETTLE_DELAY_NUMERATOR: u32 = 3;
const SETTLE_DELAY_DENOMINATOR: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    initial: Duration,
    time_for_new_tile: Duration,
    drop_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

impl Pacing {
    pub fn new(initial: Duration) -> Self {
        let mut pacing = Self {
            initial,
            time_for_new_tile: initial,
            drop_delay: Duration::ZERO,
        };
        pacing.setup_speed(initial);
        pacing
    }

    pub fn setup_speed(&mut self, initial: Duration) {
        self.initial = initial;
        self.time_for_new_tile = initial;
        self.drop_delay = initial / DROP_DELAY_DIVISOR;
    }

    /// Shorten the spawn interval by `step_multiplier × initial / factor`, never going
    /// below `max_speed`. Returns whether anything changed.
    pub fn change_speed(&mut self, step_multiplier: f32, factor: f32, max_speed: Duration) -> bool {
        if self.time_for_new_tile <= max_speed {
            return false;
        }
        let ratio = f64::from(step_multiplier) / f64::from(factor);
        if !ratio.is_finite() || ratio <= 0.0 {
            return false;
        }
        // Whole nanoseconds so repeated steps land on exact values.
        let step = Duration::from_nanos((self.initial.as_nanos() as f64 * ratio).round() as u64);
        self.time_for_new_tile = self.time_for_new_tile.saturating_sub(step).max(max_speed);
        self.drop_delay = self.time_for_new_tile / DROP_DELAY_DIVISOR;
        true
    }

    pub fn initial_speed(&self) -> Duration {
        self.initial
    }

    pub fn time_for_new_tile(&self) -> Duration {
        self.time_for_new_tile
    }

    pub fn drop_delay(&self) -> Duration {
        self.drop_delay
    }

    pub fn settle_delay(&self) -> Duration {
        self.drop_delay * SETTLE_DELAY_NUMERATOR / SETTLE_DELAY_DENOMINATOR
    }

    pub fn is_at_max(&self, max_speed: Duration) -> bool {
        self.time_for_new_tile <= max_speed
    }
}

impl Board {
    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    pub fn setup_speed(&mut self, initial: Duration) {
        self.pacing.setup_speed(initial);
    }

    pub fn change_speed(&mut self, step_multiplier: f32, factor: f32, max_speed: Duration) -> bool {
        let changed = self.pacing.change_speed(step_multiplier, factor, max_speed);
        if changed {
            tracing::debug!(
                interval_ms = self.pacing.time_for_new_tile().as_millis() as u64,
                "spawn pace increased"
            );
        }
        changed
    }
}
