//! Scorekeeper fed by `MatchesFound` events.
//!
//! A match is worth its tile count times the current pace, plus a flat bonus when the
//! board demands runs longer than three. Every ten matches and every hundred matched
//! tiles award a milestone bonus that grows each time it is reached.

use std::time::Duration;

const PACE_CEILING_SECS: f64 = 10.0;
const EXCESS_MATCH_MULTIPLIER: u64 = 3;
const BASE_MATCH_LENGTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Milestone {
    step: u64,
    next: u64,
    threshold: u64,
    multiplier: u64,
}

impl Milestone {
    fn new(step: u64) -> Self {
        Self {
            step,
            next: step,
            threshold: step,
            multiplier: 1,
        }
    }

    /// Bonus for every milestone `count` has reached since the last call.
    fn award(&mut self, count: u64) -> u64 {
        let mut bonus = 0;
        while count >= self.next {
            bonus += self.threshold * self.multiplier;
            self.multiplier += 1;
            self.threshold += self.step;
            self.next += self.step;
        }
        bonus
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreKeeper {
    score: u64,
    total_matches: u64,
    matched_tiles: u64,
    match_milestone: Milestone,
    tile_milestone: Milestone,
}

impl Default for ScoreKeeper {
    fn default() -> Self {
        Self {
            score: 0,
            total_matches: 0,
            matched_tiles: 0,
            match_milestone: Milestone::new(10),
            tile_milestone: Milestone::new(100),
        }
    }
}

impl ScoreKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one match of `tiles` cells. Returns the points it earned, bonuses included.
    pub fn record_match(&mut self, tiles: usize, drop_delay: Duration, tiles_required: usize) -> u64 {
        let pace = (PACE_CEILING_SECS - drop_delay.as_secs_f64()).floor().max(0.0) as u64;
        let excess = tiles_required.saturating_sub(BASE_MATCH_LENGTH) as u64;
        let mut gained = tiles as u64 * pace + EXCESS_MATCH_MULTIPLIER * excess;

        self.total_matches += 1;
        self.matched_tiles += tiles as u64;
        gained += self.match_milestone.award(self.total_matches);
        gained += self.tile_milestone.award(self.matched_tiles);

        self.score += gained;
        gained
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn total_matches(&self) -> u64 {
        self.total_matches
    }

    pub fn matched_tiles(&self) -> u64 {
        self.matched_tiles
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
