//! Drop processes: one cooperative state machine per falling tile, and the scheduler
//! that polls them once per frame.
//!
//! A process owns its tile through the tile's pending-drop handle. The handle travels
//! with the tile as it falls and is released when the tile comes to rest, so a tile is
//! never driven by two processes at once.

use crate::board::{Board, Coord, DropHandle};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropState {
    /// Waiting for the cell below to empty, or about to find it can fall no further.
    Waiting,
    /// The cell below is reserved; the step commits once the drop delay has elapsed.
    Stepping,
    /// Resting; the final match check runs once the settle delay has elapsed.
    Settling,
    Done,
}

#[derive(Debug, Clone)]
pub struct DropProcess {
    handle: DropHandle,
    at: Coord,
    state: DropState,
    elapsed: Duration,
}

impl DropProcess {
    fn new(handle: DropHandle, at: Coord) -> Self {
        Self {
            handle,
            at,
            state: DropState::Waiting,
            elapsed: Duration::ZERO,
        }
    }

    /// Current position of the tile this process drives.
    pub fn at(&self) -> Coord {
        self.at
    }

    pub fn state(&self) -> DropState {
        self.state
    }

    pub fn handle(&self) -> DropHandle {
        self.handle
    }

    pub fn is_done(&self) -> bool {
        self.state == DropState::Done
    }

    fn enter(&mut self, state: DropState) {
        self.state = state;
        self.elapsed = Duration::ZERO;
    }

    /// Advance by `dt`. Moves the tile at most one cell per call.
    pub fn poll(&mut self, board: &mut Board, dt: Duration) -> DropState {
        if self.state == DropState::Done {
            return self.state;
        }
        if !board.holds_drop(self.at, self.handle) {
            // The tile was matched away or overwritten under us.
            board.release_drop(self.at, self.handle);
            self.enter(DropState::Done);
            return self.state;
        }
        self.elapsed += dt;

        loop {
            match self.state {
                DropState::Waiting => {
                    if !board.valid_drop(self.at) {
                        board[self.at].moving = false;
                        self.enter(DropState::Settling);
                        continue;
                    }
                    let Some(below) = board.below(self.at) else {
                        return self.state;
                    };
                    if !board[below].is_empty() {
                        return self.state;
                    }
                    board[below].resolving = true;
                    self.enter(DropState::Stepping);
                }
                DropState::Stepping => {
                    if self.elapsed < board.pacing().drop_delay() {
                        return self.state;
                    }
                    let below_is_empty = board.below(self.at).is_some_and(|b| board[b].is_empty());
                    if !below_is_empty {
                        self.enter(DropState::Waiting);
                        continue;
                    }
                    self.at = board.step_drop(self.at);
                    let next = if board[self.at].moving {
                        DropState::Waiting
                    } else {
                        DropState::Settling
                    };
                    self.enter(next);
                    return self.state;
                }
                DropState::Settling => {
                    if board[self.at].moving {
                        self.enter(DropState::Waiting);
                        continue;
                    }
                    if self.elapsed < board.pacing().settle_delay() {
                        return self.state;
                    }
                    board.release_drop(self.at, self.handle);
                    board.resolve_matches(self.at, None, false);
                    self.enter(DropState::Done);
                    return self.state;
                }
                DropState::Done => return self.state,
            }
        }
    }
}

impl Board {
    /// Start a drop process for the falling tile at `c`. Returns `None` when the tile is
    /// not falling or already has a live process.
    pub fn begin_drop(&mut self, c: Coord) -> Option<DropProcess> {
        let tile = self.get(c)?;
        if !tile.moving || !tile.is_filled() || tile.pending_drop.is_some() {
            return None;
        }
        let handle = self.next_drop_handle();
        self[c].pending_drop = Some(handle);
        debug!(at = %c, "drop started");
        Some(DropProcess::new(handle, c))
    }

    fn holds_drop(&self, c: Coord, handle: DropHandle) -> bool {
        self.get(c)
            .is_some_and(|t| t.is_filled() && t.pending_drop == Some(handle))
    }

    fn release_drop(&mut self, c: Coord, handle: DropHandle) {
        if let Some(tile) = self.get_mut(c) {
            if tile.pending_drop == Some(handle) {
                tile.pending_drop = None;
            }
        }
    }

    /// Move the tile at `from` one cell down and recompute the flags of both cells.
    /// Returns the tile's new position.
    fn step_drop(&mut self, from: Coord) -> Coord {
        let Some(to) = self.below(from) else {
            return from;
        };
        // Carry the falling flag first so the forced swap does not match mid-fall.
        self[to].moving = true;
        self.swap_tiles(from, to, true);

        let above_filled = self.above(from).is_some_and(|a| self[a].is_filled());
        let handle = self[from].pending_drop.take();
        let origin = &mut self[from];
        origin.moving = false;
        origin.resolving = above_filled;

        let still_falling = self.valid_drop(to);
        let dest = &mut self[to];
        dest.resolving = false;
        dest.moving = still_falling;
        dest.pending_drop = handle;
        debug!(from = %from, to = %to, still_falling, "drop step");
        to
    }
}

/// Polls every live drop process once per frame.
#[derive(Debug, Default)]
pub struct DropScheduler {
    live: Vec<DropProcess>,
}

impl DropScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start processes for newly falling tiles, then poll all of them bottom row first.
    pub fn tick(&mut self, board: &mut Board, dt: Duration) {
        for c in board.falling_tiles() {
            if let Some(process) = board.begin_drop(c) {
                self.live.push(process);
            }
        }
        self.live.sort_by_key(DropProcess::at);
        for process in &mut self.live {
            process.poll(board, dt);
        }
        self.live.retain(|p| !p.is_done());
    }

    /// Tick with a fixed `dt` until nothing is falling. Returns false when `max_ticks`
    /// ran out first.
    pub fn run_until_settled(&mut self, board: &mut Board, dt: Duration, max_ticks: usize) -> bool {
        for _ in 0..max_ticks {
            if self.is_idle() && board.falling_tiles().is_empty() {
                return true;
            }
            self.tick(board, dt);
        }
        self.is_idle() && board.falling_tiles().is_empty()
    }

    /// Drop every live process and release its handle. Tiles keep their flags.
    pub fn cancel_all(&mut self, board: &mut Board) {
        for process in self.live.drain(..) {
            board.release_drop(process.at, process.handle);
        }
    }

    pub fn live(&self) -> &[DropProcess] {
        &self.live
    }

    pub fn is_idle(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use crate::events::{BoardEvent, EventKind};

    fn board(rows: &[&[i32]]) -> Board {
        let config = BoardConfig {
            seed: Some(11),
            ..BoardConfig::default()
        };
        Board::from_rows(&config, rows).unwrap()
    }

    fn delay(board: &Board) -> Duration {
        board.pacing().drop_delay()
    }

    #[test]
    fn tile_falls_to_the_bottom_one_cell_per_step() {
        let mut board = board(&[&[2], &[0], &[0]]);
        board[Coord::new(2, 0)].moving = true;
        let dt = delay(&board);
        let mut scheduler = DropScheduler::new();

        scheduler.tick(&mut board, dt);
        assert_eq!(scheduler.live()[0].state(), DropState::Stepping);
        assert!(board[Coord::new(1, 0)].resolving);

        scheduler.tick(&mut board, dt);
        assert_eq!(board.to_rows(), vec![vec![0], vec![2], vec![0]]);

        assert!(scheduler.run_until_settled(&mut board, dt, 10));
        assert_eq!(board.to_rows(), vec![vec![0], vec![0], vec![2]]);
        let bottom = board[Coord::new(0, 0)];
        assert!(!bottom.moving && !bottom.resolving && bottom.pending_drop().is_none());
    }

    #[test]
    fn step_waits_for_the_drop_delay() {
        let mut board = board(&[&[2], &[0]]);
        board[Coord::new(1, 0)].moving = true;
        let half = delay(&board) / 2;
        let mut scheduler = DropScheduler::new();

        scheduler.tick(&mut board, half);
        scheduler.tick(&mut board, half);
        assert_eq!(board.to_rows(), vec![vec![2], vec![0]]);
        scheduler.tick(&mut board, half);
        assert_eq!(board.to_rows(), vec![vec![0], vec![2]]);
    }

    #[test]
    fn a_tile_never_gets_two_processes() {
        let mut board = board(&[&[2], &[0]]);
        let c = Coord::new(1, 0);
        board[c].moving = true;
        let first = board.begin_drop(c);
        assert!(first.is_some());
        assert!(board.begin_drop(c).is_none());

        let mut scheduler = DropScheduler::new();
        scheduler.tick(&mut board, Duration::ZERO);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn landing_completes_a_vertical_match() {
        let mut board = board(&[&[3], &[0], &[3], &[3]]);
        board[Coord::new(3, 0)].moving = true;
        let matches = board.subscribe_to(&[EventKind::MatchesFound]);
        let mut scheduler = DropScheduler::new();

        let dt = delay(&board);
        assert!(scheduler.run_until_settled(&mut board, dt, 20));
        assert_eq!(board.to_rows(), vec![vec![0], vec![0], vec![0], vec![0]]);
        assert_eq!(
            matches.drain(),
            vec![BoardEvent::MatchesFound(vec![
                Coord::new(0, 0),
                Coord::new(1, 0),
                Coord::new(2, 0)
            ])]
        );
    }

    #[test]
    fn landing_match_waits_for_the_settle_delay() {
        let mut board = board(&[&[3], &[0], &[3], &[3]]);
        board[Coord::new(3, 0)].moving = true;
        let matches = board.subscribe_to(&[EventKind::MatchesFound]);
        let settle = board.pacing().settle_delay();
        let mut scheduler = DropScheduler::new();

        let dt = delay(&board);
        scheduler.tick(&mut board, dt);
        scheduler.tick(&mut board, dt);
        assert_eq!(board.to_rows(), vec![vec![0], vec![3], vec![3], vec![3]]);
        assert_eq!(scheduler.live()[0].state(), DropState::Settling);
        assert!(matches.drain().is_empty());

        scheduler.tick(&mut board, settle - Duration::from_nanos(1));
        assert!(matches.drain().is_empty());
        scheduler.tick(&mut board, Duration::from_nanos(1));
        assert_eq!(matches.drain().len(), 1);
        assert_eq!(board.to_rows(), vec![vec![0], vec![0], vec![0], vec![0]]);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn stacked_tiles_fall_together() {
        let mut board = board(&[&[1], &[2], &[0], &[0], &[3]]);
        board.propagate_falls(&[Coord::new(2, 0)]);
        let mut scheduler = DropScheduler::new();

        let dt = delay(&board);
        assert!(scheduler.run_until_settled(&mut board, dt, 30));
        assert_eq!(board.to_rows(), vec![vec![0], vec![0], vec![1], vec![2], vec![3]]);
        assert!(board.coords().all(|c| !board[c].resolving));
    }

    #[test]
    fn matched_away_tile_ends_its_process() {
        let mut board = board(&[&[2], &[0]]);
        let c = Coord::new(1, 0);
        board[c].moving = true;
        let mut process = board.begin_drop(c).unwrap();
        board[c].value = 0;
        board[c].moving = false;
        assert_eq!(process.poll(&mut board, Duration::ZERO), DropState::Done);
        assert!(board[c].pending_drop().is_none());
    }

    #[test]
    fn cancel_releases_handles() {
        let mut board = board(&[&[2], &[0]]);
        board[Coord::new(1, 0)].moving = true;
        let mut scheduler = DropScheduler::new();
        scheduler.tick(&mut board, Duration::ZERO);
        assert_eq!(scheduler.live().len(), 1);

        scheduler.cancel_all(&mut board);
        assert!(scheduler.is_idle());
        assert!(board[Coord::new(1, 0)].pending_drop().is_none());
    }
}
