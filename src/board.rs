//! Grid store: the board as a flat `rows × columns` array of tiles.
//!
//! Row 0 is the bottom of the board and the last row is the spawn row, so "above" means
//! a larger row index. Storage is row-major (`row * columns + col`), which makes "every
//! coordinate holds exactly one tile" structural.
//!
//! Indexing with an out-of-range coordinate panics; use [`Board::get`] or
//! [`Board::neighbor`] for checked access.

use crate::config::{BoardConfig, ConfigError};
use crate::events::{BoardEvent, EventHub, EventKind, Subscription, SubscriptionId};
use crate::pacing::Pacing;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Value of an empty cell.
pub const EMPTY: i32 = 0;
/// Value of a permanently blocked cell. Never moves, never matches, never swaps.
pub const BLOCKED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True when the two coordinates share an edge.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Above,
    Below,
}

/// Token held by a tile while a drop process owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropHandle(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tile {
    pub value: i32,
    /// Falling: a drop process is live or about to start for this tile.
    pub moving: bool,
    /// Excluded from swaps while a cascade settles into or out of this cell.
    pub resolving: bool,
    pub(crate) pending_drop: Option<DropHandle>,
}

impl Tile {
    pub const fn new(value: i32) -> Self {
        Self {
            value,
            moving: false,
            resolving: false,
            pending_drop: None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value == EMPTY
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.value == BLOCKED
    }

    /// Holds a real tile type (not empty, not blocked).
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.value > EMPTY
    }

    pub fn pending_drop(&self) -> Option<DropHandle> {
        self.pending_drop
    }
}

#[derive(Debug)]
pub struct Board {
    rows: usize,
    columns: usize,
    tiles_required_to_match: usize,
    distinct_tile_types: usize,
    default_row_fill_count: usize,
    tiles: Vec<Tile>,
    events: EventHub,
    /// Whether the fall propagator still listens to match and swap notifications.
    fall_propagation: bool,
    pub(crate) rng: StdRng,
    pub(crate) pacing: Pacing,
    next_drop_handle: u64,
}

impl Board {
    pub fn new(config: &BoardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            rows: config.rows,
            columns: config.columns,
            tiles_required_to_match: config.tiles_required_to_match,
            distinct_tile_types: config.distinct_tile_types,
            default_row_fill_count: config.default_row_fill_count,
            tiles: vec![Tile::default(); config.rows * config.columns],
            events: EventHub::new(),
            fall_propagation: true,
            rng,
            pacing: Pacing::default(),
            next_drop_handle: 0,
        })
    }

    /// Build a board from literal values, listed top row first as they read on screen.
    /// `rows` and `columns` in `config` are replaced by the shape of `values`.
    pub fn from_rows<R: AsRef<[i32]>>(
        config: &BoardConfig,
        values: &[R],
    ) -> Result<Self, ConfigError> {
        let rows = values.len();
        let columns = values.first().map_or(0, |r| r.as_ref().len());
        let config = BoardConfig {
            rows,
            columns,
            default_row_fill_count: config.default_row_fill_count.min(rows),
            ..config.clone()
        };
        let mut board = Self::new(&config)?;
        for (i, line) in values.iter().enumerate() {
            let line = line.as_ref();
            if line.len() != columns {
                return Err(ConfigError::RaggedRows {
                    row: i,
                    len: line.len(),
                    expected: columns,
                });
            }
            let row = rows - 1 - i;
            for (col, &value) in line.iter().enumerate() {
                board[Coord::new(row, col)].value = value;
            }
        }
        Ok(board)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Index of the spawn row.
    #[inline]
    pub fn top_row(&self) -> usize {
        self.rows - 1
    }

    pub fn tiles_required_to_match(&self) -> usize {
        self.tiles_required_to_match
    }

    pub fn distinct_tile_types(&self) -> usize {
        self.distinct_tile_types
    }

    pub fn default_row_fill_count(&self) -> usize {
        self.default_row_fill_count
    }

    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        c.row < self.rows && c.col < self.columns
    }

    #[inline]
    fn index_of(&self, c: Coord) -> usize {
        assert!(
            self.contains(c),
            "coordinate {c} outside {}x{} board",
            self.rows,
            self.columns
        );
        c.row * self.columns + c.col
    }

    pub fn get(&self, c: Coord) -> Option<&Tile> {
        self.contains(c).then(|| &self.tiles[c.row * self.columns + c.col])
    }

    pub fn get_mut(&mut self, c: Coord) -> Option<&mut Tile> {
        if self.contains(c) {
            Some(&mut self.tiles[c.row * self.columns + c.col])
        } else {
            None
        }
    }

    /// Value at `c`. Panics when out of range.
    #[inline]
    pub fn value(&self, c: Coord) -> i32 {
        self[c].value
    }

    /// Neighbour in `dir`, or `None` past the edge of the board.
    pub fn neighbor(&self, c: Coord, dir: Direction) -> Option<Coord> {
        if !self.contains(c) {
            return None;
        }
        let next = match dir {
            Direction::Left => Coord::new(c.row, c.col.checked_sub(1)?),
            Direction::Right => Coord::new(c.row, c.col + 1),
            Direction::Above => Coord::new(c.row + 1, c.col),
            Direction::Below => Coord::new(c.row.checked_sub(1)?, c.col),
        };
        self.contains(next).then_some(next)
    }

    #[inline]
    pub fn above(&self, c: Coord) -> Option<Coord> {
        self.neighbor(c, Direction::Above)
    }

    #[inline]
    pub fn below(&self, c: Coord) -> Option<Coord> {
        self.neighbor(c, Direction::Below)
    }

    /// Every coordinate, bottom row first, left to right.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let columns = self.columns;
        (0..self.rows * columns).map(move |i| Coord::new(i / columns, i % columns))
    }

    /// Coordinates of every tile currently flagged `moving`, bottom row first.
    pub fn falling_tiles(&self) -> Vec<Coord> {
        self.coords().filter(|&c| self[c].moving).collect()
    }

    /// Values listed top row first, the inverse of [`Board::from_rows`].
    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        (0..self.rows)
            .rev()
            .map(|row| {
                (0..self.columns)
                    .map(|col| self[Coord::new(row, col)].value)
                    .collect()
            })
            .collect()
    }

    pub fn subscribe(&mut self) -> Subscription {
        self.events.subscribe()
    }

    pub fn subscribe_to(&mut self, kinds: &[EventKind]) -> Subscription {
        self.events.subscribe_to(kinds)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Detach the fall propagator and every subscriber. Used when a session is abandoned.
    pub fn detach_listeners(&mut self) {
        self.fall_propagation = false;
        self.events.clear();
    }

    pub fn is_fall_propagation_attached(&self) -> bool {
        self.fall_propagation
    }

    /// Publish `event`, running the fall propagator first for match and swap events.
    pub(crate) fn notify(&mut self, event: BoardEvent) {
        if self.fall_propagation {
            if let BoardEvent::MatchesFound(coords) | BoardEvent::TilesSwapped(coords) = &event {
                self.propagate_falls(coords);
            }
        }
        self.events.publish(&event);
    }

    pub(crate) fn next_drop_handle(&mut self) -> DropHandle {
        let handle = DropHandle(self.next_drop_handle);
        self.next_drop_handle += 1;
        handle
    }
}

impl Index<Coord> for Board {
    type Output = Tile;

    fn index(&self, c: Coord) -> &Tile {
        &self.tiles[self.index_of(c)]
    }
}

impl IndexMut<Coord> for Board {
    fn index_mut(&mut self, c: Coord) -> &mut Tile {
        let i = self.index_of(c);
        &mut self.tiles[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BoardConfig {
        BoardConfig {
            rows: 4,
            columns: 5,
            seed: Some(7),
            ..BoardConfig::default()
        }
    }

    #[test]
    fn new_board_is_empty() {
        let board = Board::new(&config()).unwrap();
        assert_eq!(board.coords().count(), 20);
        assert!(board.coords().all(|c| board[c] == Tile::default()));
        assert!(board.falling_tiles().is_empty());
    }

    #[test]
    fn flat_index_is_row_major() {
        let board = Board::new(&config()).unwrap();
        assert_eq!(board.index_of(Coord::new(0, 0)), 0);
        assert_eq!(board.index_of(Coord::new(0, 4)), 4);
        assert_eq!(board.index_of(Coord::new(1, 0)), 5);
        assert_eq!(board.index_of(Coord::new(3, 4)), 19);
    }

    #[test]
    #[should_panic(expected = "outside 4x5 board")]
    fn column_overflow_does_not_alias_next_row() {
        let board = Board::new(&config()).unwrap();
        let _ = board[Coord::new(0, 5)];
    }

    #[test]
    fn neighbors_stop_at_edges() {
        let board = Board::new(&config()).unwrap();
        let corner = Coord::new(0, 0);
        assert_eq!(board.neighbor(corner, Direction::Below), None);
        assert_eq!(board.neighbor(corner, Direction::Left), None);
        assert_eq!(board.neighbor(corner, Direction::Above), Some(Coord::new(1, 0)));
        assert_eq!(board.neighbor(corner, Direction::Right), Some(Coord::new(0, 1)));

        let top_right = Coord::new(3, 4);
        assert_eq!(board.neighbor(top_right, Direction::Above), None);
        assert_eq!(board.neighbor(top_right, Direction::Right), None);
        assert_eq!(board.neighbor(Coord::new(9, 9), Direction::Below), None);
    }

    #[test]
    fn from_rows_reads_top_row_first() {
        let board = Board::from_rows(&config(), &[[2, 0], [1, 3]]).unwrap();
        assert_eq!(board.rows(), 2);
        assert_eq!(board.columns(), 2);
        assert_eq!(board.value(Coord::new(1, 0)), 2);
        assert_eq!(board.value(Coord::new(0, 1)), 3);
        assert_eq!(board.to_rows(), vec![vec![2, 0], vec![1, 3]]);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let rows: [&[i32]; 2] = [&[1, 2], &[1]];
        assert_eq!(
            Board::from_rows(&config(), &rows).unwrap_err(),
            ConfigError::RaggedRows {
                row: 1,
                len: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn adjacency() {
        assert!(Coord::new(1, 1).is_adjacent(Coord::new(1, 2)));
        assert!(Coord::new(1, 1).is_adjacent(Coord::new(0, 1)));
        assert!(!Coord::new(1, 1).is_adjacent(Coord::new(2, 2)));
        assert!(!Coord::new(1, 1).is_adjacent(Coord::new(1, 1)));
    }
}
