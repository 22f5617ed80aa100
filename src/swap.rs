//! Swap executor: player swaps and the forced swaps used by falling tiles.

use crate::board::{Board, Coord};
use crate::events::BoardEvent;
use thiserror::Error;
use tracing::debug;

/// Why a player swap was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SwapRejection {
    #[error("coordinate outside the board")]
    OutOfBounds,
    #[error("cannot swap a tile with itself")]
    SameTile,
    #[error("a tile is falling")]
    Moving,
    #[error("both cells are empty")]
    BothEmpty,
    #[error("a tile is blocked")]
    Blocked,
    #[error("a cascade is settling")]
    Resolving,
}

impl Board {
    /// Check a player swap without touching the board.
    pub fn check_swap(&self, a: Coord, b: Coord) -> Result<(), SwapRejection> {
        let (Some(ta), Some(tb)) = (self.get(a), self.get(b)) else {
            return Err(SwapRejection::OutOfBounds);
        };
        if a == b {
            return Err(SwapRejection::SameTile);
        }
        if ta.moving || tb.moving {
            return Err(SwapRejection::Moving);
        }
        if ta.is_empty() && tb.is_empty() {
            return Err(SwapRejection::BothEmpty);
        }
        if ta.is_blocked() || tb.is_blocked() {
            return Err(SwapRejection::Blocked);
        }
        if ta.resolving || tb.resolving {
            return Err(SwapRejection::Resolving);
        }
        Ok(())
    }

    pub fn can_swap(&self, a: Coord, b: Coord) -> bool {
        self.check_swap(a, b).is_ok()
    }

    /// Exchange the values at `a` and `b`.
    ///
    /// A player swap (`forced == false`) is validated first and returns `false` without
    /// side effects when refused; its matches resolve before `TilesSwapped` is published.
    /// A forced swap always happens and only checks `b` for matches when `b` is at rest.
    pub fn swap_tiles(&mut self, a: Coord, b: Coord, forced: bool) -> bool {
        if forced {
            self.exchange_values(a, b);
            if !self[b].moving {
                self.resolve_matches(b, None, false);
            }
            self.notify(BoardEvent::Changed(vec![a, b]));
            return true;
        }

        if let Err(reason) = self.check_swap(a, b) {
            debug!(%a, %b, %reason, "swap rejected");
            return false;
        }
        self.exchange_values(a, b);
        self.notify(BoardEvent::Changed(vec![a, b]));
        self.resolve_matches(a, Some(b), false);
        self.notify(BoardEvent::TilesSwapped(vec![a, b]));
        true
    }

    /// Values move, flags and drop handles stay with their cells.
    fn exchange_values(&mut self, a: Coord, b: Coord) {
        let va = self[a].value;
        self[a].value = self[b].value;
        self[b].value = va;
    }
}
