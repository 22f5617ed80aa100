//! Spawner and overflow guard: placing tiles, filling the board, random values.

use crate::board::{Board, Coord, EMPTY};
use crate::config::{ConfigError, MIN_DISTINCT_TILE_TYPES};
use crate::events::BoardEvent;
use rand::Rng;
use tracing::{debug, info};

impl Board {
    /// Write `value` at `coord`.
    ///
    /// With `from_top`, a non-empty value aimed at an occupied cell publishes `Overflow`
    /// and leaves the board as it was. A placed tile falls when the cell below is empty
    /// or falling, and is checked for matches otherwise. Returns whether the value was
    /// written.
    pub fn place_tile(&mut self, value: i32, coord: Coord, from_top: bool) -> bool {
        if !self.contains(coord) {
            debug!(at = %coord, "placement outside the board");
            return false;
        }
        if from_top && value != EMPTY && !self[coord].is_empty() {
            info!(at = %coord, "board overflow");
            self.notify(BoardEvent::Overflow);
            return false;
        }

        let tile = &mut self[coord];
        tile.value = value;
        if value <= EMPTY {
            tile.moving = false;
            tile.pending_drop = None;
        }
        self.notify(BoardEvent::Changed(vec![coord]));

        if value > EMPTY {
            let falls = self
                .below(coord)
                .is_some_and(|b| self[b].is_empty() || self[b].moving);
            if falls {
                self[coord].moving = true;
            } else {
                self.resolve_matches(coord, None, false);
            }
        }
        true
    }

    /// Drop one value per column into the top row. Stops at the first overflow.
    pub fn place_row(&mut self, values: &[i32]) -> bool {
        let top = self.top_row();
        for (col, &value) in values.iter().take(self.columns()).enumerate() {
            if !self.place_tile(value, Coord::new(top, col), true) {
                return false;
            }
        }
        true
    }

    /// Fill the bottom `row_count` rows with values in `1..=num_types` so that no match
    /// exists. The highest filled row may also draw empty cells. Publishes one `Changed`
    /// with every filled coordinate.
    ///
    /// The band is cleared first, so each draw only competes with the cells already drawn
    /// to its left and below. Those exclude at most two values, and the top row of the
    /// band can always fall back to empty.
    pub fn fill_board_random(
        &mut self,
        num_types: usize,
        row_count: usize,
    ) -> Result<Vec<Coord>, ConfigError> {
        if num_types < MIN_DISTINCT_TILE_TYPES {
            return Err(ConfigError::TooFewTileTypes(num_types));
        }
        if row_count > self.rows() {
            return Err(ConfigError::FillRowsExceedBoard {
                rows: row_count,
                height: self.rows(),
            });
        }
        let max = i32::try_from(num_types).unwrap_or(i32::MAX);

        for row in 0..row_count {
            for col in 0..self.columns() {
                let tile = &mut self[Coord::new(row, col)];
                tile.value = EMPTY;
                tile.moving = false;
                tile.resolving = false;
                tile.pending_drop = None;
            }
        }

        let mut filled = Vec::with_capacity(row_count * self.columns());
        for row in 0..row_count {
            let lowest = if row + 1 == row_count { EMPTY } else { 1 };
            for col in 0..self.columns() {
                let c = Coord::new(row, col);
                loop {
                    self[c].value = self.rng.random_range(lowest..=max);
                    if self.resolve_matches(c, None, true).is_empty() {
                        break;
                    }
                }
                filled.push(c);
            }
        }
        debug!(rows = row_count, types = num_types, "board filled");
        self.notify(BoardEvent::Changed(filled.clone()));
        Ok(filled)
    }

    /// Fill the configured number of rows with the configured tile types.
    pub fn fill_default(&mut self) -> Result<Vec<Coord>, ConfigError> {
        self.fill_board_random(self.distinct_tile_types(), self.default_row_fill_count())
    }

    /// A random tile type in `1..=distinct_tile_types`.
    pub fn random_tile(&mut self) -> i32 {
        let max = i32::try_from(self.distinct_tile_types()).unwrap_or(i32::MAX);
        self.rng.random_range(1..=max)
    }

    /// Like [`Board::random_tile`], but may also come up empty.
    pub fn random_value(&mut self) -> i32 {
        let max = i32::try_from(self.distinct_tile_types()).unwrap_or(i32::MAX);
        self.rng.random_range(EMPTY..=max)
    }

    /// One random tile per column.
    pub fn random_row(&mut self) -> Vec<i32> {
        (0..self.columns()).map(|_| self.random_tile()).collect()
    }

    pub fn random_column(&mut self) -> usize {
        self.rng.random_range(0..self.columns())
    }
}
