//! Match detector: axis run scans and match resolution.

use crate::board::{Board, Coord, Direction, EMPTY};
use crate::events::BoardEvent;
use tracing::info;

impl Board {
    /// Horizontal run through `origin`, or nothing when shorter than the match length.
    pub fn matches_horizontal(&self, origin: Coord) -> Vec<Coord> {
        self.scan_axis(origin, Direction::Left, Direction::Right)
    }

    /// Vertical run through `origin`, or nothing when shorter than the match length.
    pub fn matches_vertical(&self, origin: Coord) -> Vec<Coord> {
        self.scan_axis(origin, Direction::Below, Direction::Above)
    }

    fn scan_axis(&self, origin: Coord, back: Direction, forward: Direction) -> Vec<Coord> {
        let Some(tile) = self.get(origin) else {
            return Vec::new();
        };
        // Empty cells never start a run, nor do blocked ones.
        if !tile.is_filled() {
            return Vec::new();
        }
        let value = tile.value;
        let mut run = vec![origin];
        for dir in [back, forward] {
            let mut cursor = origin;
            while let Some(next) = self.neighbor(cursor, dir) {
                let t = &self[next];
                if t.value != value || t.moving {
                    break;
                }
                run.push(next);
                cursor = next;
            }
        }
        if run.len() < self.tiles_required_to_match() {
            run.clear();
        }
        run
    }

    /// Every coordinate matched through `a` (and `b`, when given), sorted and de-duplicated.
    ///
    /// Unless `dry_run`, the matched cells are cleared and `Changed` then `MatchesFound`
    /// are published with the set.
    pub fn resolve_matches(&mut self, a: Coord, b: Option<Coord>, dry_run: bool) -> Vec<Coord> {
        let mut matched = self.matches_horizontal(a);
        matched.extend(self.matches_vertical(a));
        if let Some(b) = b {
            matched.extend(self.matches_horizontal(b));
            matched.extend(self.matches_vertical(b));
        }
        matched.sort_unstable();
        matched.dedup();

        if dry_run || matched.is_empty() {
            return matched;
        }

        for &c in &matched {
            let tile = &mut self[c];
            tile.value = EMPTY;
            tile.moving = false;
            tile.pending_drop = None;
        }
        info!(count = matched.len(), at = %a, "matched");
        self.notify(BoardEvent::Changed(matched.clone()));
        self.notify(BoardEvent::MatchesFound(matched.clone()));
        matched
    }
}
