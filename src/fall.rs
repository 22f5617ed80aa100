//! Fall propagator: flags tiles that must fall after a match or a swap.

use crate::board::{Board, Coord};
use tracing::trace;

impl Board {
    /// Mark `moving` on every tile left without support by a change at `touched`, and
    /// `resolving` on the cells they will fall into.
    ///
    /// Runs automatically on `MatchesFound` and `TilesSwapped` while the propagator is
    /// attached; exposed for drivers that edit the board directly.
    pub fn propagate_falls(&mut self, touched: &[Coord]) {
        for &c in touched {
            let Some(tile) = self.get(c) else {
                continue;
            };
            if tile.is_empty() {
                self.release_column_above(c);
            } else if tile.is_filled() {
                self.settle_onto_gap(c);
            }
        }
    }

    /// `c` was emptied: everything stacked on it falls.
    fn release_column_above(&mut self, c: Coord) {
        let Some(above) = self.above(c) else {
            return;
        };
        self[c].resolving = self[above].is_filled();
        self.mark_stack_moving(above);
    }

    /// `c` holds a tile: it falls when some cell under it is empty or already falling.
    fn settle_onto_gap(&mut self, c: Coord) {
        let mut deepest_gap = None;
        let mut cursor = c;
        while let Some(next) = self.below(cursor) {
            let t = &mut self[next];
            if t.is_blocked() {
                break;
            }
            if t.is_empty() {
                t.resolving = true;
                deepest_gap = Some(next);
            } else if t.moving {
                deepest_gap = Some(next);
            }
            cursor = next;
        }
        let Some(gap) = deepest_gap else {
            return;
        };

        trace!(at = %c, gap = %gap, "tile loses support");
        // Every tile between the origin and the gap is unsupported too.
        for row in gap.row + 1..c.row {
            let t = &mut self[Coord::new(row, c.col)];
            if t.is_filled() {
                t.moving = true;
            }
        }
        self.mark_stack_moving(c);
    }

    /// Mark `from` and the contiguous tiles above it as falling.
    fn mark_stack_moving(&mut self, from: Coord) {
        let mut cursor = Some(from);
        while let Some(c) = cursor {
            let t = &mut self[c];
            if !t.is_filled() {
                break;
            }
            t.moving = true;
            cursor = self.above(c);
        }
    }

    /// True when the tile at `c` still has somewhere to fall: the cell below is empty or
    /// its occupant is falling itself.
    pub fn valid_drop(&self, c: Coord) -> bool {
        let Some(below) = self.below(c) else {
            return false;
        };
        let t = &self[below];
        !t.is_blocked() && (t.is_empty() || t.moving)
    }
}
