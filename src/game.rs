//! Game session: a board driven by one of the game modes.
//!
//! The session owns the board, the drop scheduler, a subscription for matches and
//! overflow, and the score. The front end calls [`GameState::tick`] once per frame with
//! the time elapsed since the previous frame.

use crate::board::{Board, Coord, Direction};
use crate::config::{BoardConfig, ConfigError, PacingConfig};
use crate::drop_process::DropScheduler;
use crate::events::{BoardEvent, EventKind, Subscription};
use crate::score::ScoreKeeper;
use clap::ValueEnum;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum GameMode {
    /// New tiles drop at a steady pace until the board overflows.
    #[default]
    Endless,
    /// Like endless, but the pace quickens as matches are made.
    Speed,
    /// No new tiles; swap freely.
    Fidget,
}

impl GameMode {
    pub const ALL: [Self; 3] = [Self::Endless, Self::Speed, Self::Fidget];

    pub fn label(self) -> &'static str {
        match self {
            Self::Endless => "Endless",
            Self::Speed => "Speed",
            Self::Fidget => "Fidget",
        }
    }

    pub fn spawns_tiles(self) -> bool {
        !matches!(self, Self::Fidget)
    }

    pub fn next(self) -> Self {
        match self {
            Self::Endless => Self::Speed,
            Self::Speed => Self::Fidget,
            Self::Fidget => Self::Endless,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Endless => Self::Fidget,
            Self::Speed => Self::Endless,
            Self::Fidget => Self::Speed,
        }
    }
}

/// The tile the next spawn will drop, drawn one spawn ahead so it can be previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextSpawn {
    pub column: usize,
    pub value: i32,
}

impl NextSpawn {
    fn draw(board: &mut Board) -> Self {
        Self {
            column: board.random_column(),
            value: board.random_tile(),
        }
    }
}

#[derive(Debug)]
pub struct GameState {
    board: Board,
    scheduler: DropScheduler,
    events: Subscription,
    score: ScoreKeeper,
    mode: GameMode,
    pacing: PacingConfig,
    cursor: Coord,
    over: bool,
    elapsed: Duration,
    start_delay_left: Duration,
    since_spawn: Duration,
    next: Option<NextSpawn>,
    matches_since_speedup: u32,
    since_speedup: Duration,
    /// Cells cleared since the front end last asked, for the match flash.
    flash: Vec<Coord>,
}

impl GameState {
    pub fn new(
        mode: GameMode,
        board_config: &BoardConfig,
        pacing: &PacingConfig,
    ) -> Result<Self, ConfigError> {
        pacing.validate()?;
        let mut board = Board::new(board_config)?;
        let events = board.subscribe_to(&[EventKind::MatchesFound, EventKind::Overflow]);
        board.setup_speed(pacing.start_speed);
        board.fill_default()?;
        let next = mode.spawns_tiles().then(|| NextSpawn::draw(&mut board));
        info!(
            mode = mode.label(),
            rows = board.rows(),
            columns = board.columns(),
            "game started"
        );
        Ok(Self {
            board,
            scheduler: DropScheduler::new(),
            events,
            score: ScoreKeeper::new(),
            mode,
            pacing: pacing.clone(),
            cursor: Coord::new(0, 0),
            over: false,
            elapsed: Duration::ZERO,
            start_delay_left: pacing.start_delay,
            since_spawn: Duration::ZERO,
            next,
            matches_since_speedup: 0,
            since_speedup: pacing.speed_up_cooldown,
            flash: Vec::new(),
        })
    }

    /// Advance the session by `dt`: spawning, falling tiles, then scoring.
    pub fn tick(&mut self, dt: Duration) {
        if self.over {
            return;
        }
        self.elapsed += dt;
        self.since_speedup = self.since_speedup.saturating_add(dt);

        if self.mode.spawns_tiles() {
            // Time past the end of the start delay already counts toward the first spawn.
            let run = dt.saturating_sub(self.start_delay_left);
            self.start_delay_left = self.start_delay_left.saturating_sub(dt);
            self.since_spawn += run;

            let interval = self.board.pacing().time_for_new_tile();
            if !run.is_zero() && self.since_spawn >= interval {
                // Keep the overshoot, but never bank more than one spawn.
                self.since_spawn = (self.since_spawn - interval).min(interval);
                self.spawn_next_tile();
            }
        }

        self.scheduler.tick(&mut self.board, dt);
        self.process_events();
    }

    fn spawn_next_tile(&mut self) {
        let Some(spawn) = self.next.replace(NextSpawn::draw(&mut self.board)) else {
            return;
        };
        let top = self.board.top_row();
        self.board
            .place_tile(spawn.value, Coord::new(top, spawn.column), true);
    }

    fn process_events(&mut self) {
        for event in self.events.drain() {
            match event {
                BoardEvent::MatchesFound(coords) => self.on_match(coords),
                BoardEvent::Overflow => {
                    if !self.over {
                        info!(score = self.score.score(), "game over");
                    }
                    self.over = true;
                    self.scheduler.cancel_all(&mut self.board);
                }
                BoardEvent::Changed(_) | BoardEvent::TilesSwapped(_) => {}
            }
        }
    }

    fn on_match(&mut self, coords: Vec<Coord>) {
        self.score.record_match(
            coords.len(),
            self.board.pacing().drop_delay(),
            self.board.tiles_required_to_match(),
        );
        self.flash.extend(coords);

        if self.mode != GameMode::Speed {
            return;
        }
        self.matches_since_speedup += 1;
        if self.matches_since_speedup >= self.pacing.matches_until_speedup
            && self.since_speedup >= self.pacing.speed_up_cooldown
        {
            self.board
                .change_speed(1.0, self.pacing.speed_factor, self.pacing.max_speed);
            self.matches_since_speedup = 0;
            self.since_speedup = Duration::ZERO;
        }
    }

    /// Player swap between two cells. Returns whether it happened.
    pub fn swap(&mut self, a: Coord, b: Coord) -> bool {
        if self.over {
            return false;
        }
        let swapped = self.board.swap_tiles(a, b, false);
        self.process_events();
        swapped
    }

    /// Swap the tile under the cursor with its right-hand neighbour.
    pub fn swap_at_cursor(&mut self) -> bool {
        match self.board.neighbor(self.cursor, Direction::Right) {
            Some(right) => self.swap(self.cursor, right),
            None => false,
        }
    }

    /// Move the cursor one cell, staying on the board. The cursor covers a cell and its
    /// right-hand neighbour, so it never sits on the last column of a wider board.
    pub fn move_cursor(&mut self, dir: Direction) {
        let last_col = self.board.columns().saturating_sub(2);
        if let Some(next) = self.board.neighbor(self.cursor, dir) {
            if next.col <= last_col {
                self.cursor = next;
            }
        }
    }

    /// Detach everything from the board so the session can be dropped mid-cascade.
    pub fn abandon(&mut self) {
        self.scheduler.cancel_all(&mut self.board);
        self.board.detach_listeners();
        self.over = true;
    }

    /// Cells matched since the last call.
    pub fn take_flash(&mut self) -> Vec<Coord> {
        std::mem::take(&mut self.flash)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn score(&self) -> &ScoreKeeper {
        &self.score
    }

    pub fn cursor(&self) -> Coord {
        self.cursor
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Current spawn interval.
    pub fn pace(&self) -> Duration {
        self.board.pacing().time_for_new_tile()
    }

    pub fn start_delay_left(&self) -> Duration {
        self.start_delay_left
    }

    /// The tile the next spawn drops. `None` in modes without spawns.
    pub fn next_spawn(&self) -> Option<NextSpawn> {
        self.next
    }

    /// How far the wait for the next spawn has run, from 0.0 to 1.0.
    pub fn spawn_progress(&self) -> f64 {
        if self.next.is_none() || !self.start_delay_left.is_zero() {
            return 0.0;
        }
        let interval = self.pace();
        if interval.is_zero() {
            return 1.0;
        }
        (self.since_spawn.as_secs_f64() / interval.as_secs_f64()).min(1.0)
    }

    pub fn falling_count(&self) -> usize {
        self.board.falling_tiles().len()
    }

    pub fn live_drops(&self) -> usize {
        self.scheduler.live().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_config(rows: usize, columns: usize) -> BoardConfig {
        BoardConfig {
            rows,
            columns,
            distinct_tile_types: 3,
            default_row_fill_count: 1,
            seed: Some(9),
            ..BoardConfig::default()
        }
    }

    fn filled(game: &GameState) -> usize {
        let board = game.board();
        board.coords().filter(|&c| board[c].is_filled()).count()
    }

    fn set_row(game: &mut GameState, row: usize, values: &[i32]) {
        for (col, &v) in values.iter().enumerate() {
            game.board_mut()[Coord::new(row, col)].value = v;
        }
    }

    #[test]
    fn endless_spawns_after_the_start_delay() {
        let pacing = PacingConfig::default();
        let mut game = GameState::new(GameMode::Endless, &board_config(8, 10), &pacing).unwrap();
        let before = filled(&game);

        game.tick(pacing.start_delay);
        game.tick(pacing.start_speed / 2);
        assert_eq!(filled(&game), before);

        game.tick(pacing.start_speed / 2);
        assert_eq!(filled(&game), before + 1);
        let top = game.board().top_row();
        assert_eq!(
            (0..10)
                .filter(|&col| game.board()[Coord::new(top, col)].moving)
                .count(),
            1
        );
    }

    #[test]
    fn previewed_tile_is_the_one_that_drops() {
        let pacing = PacingConfig::default();
        let mut game = GameState::new(GameMode::Endless, &board_config(8, 10), &pacing).unwrap();
        let next = game.next_spawn().unwrap();
        assert!(next.column < 10);
        assert!((1..=3).contains(&next.value));

        game.tick(pacing.start_delay);
        assert_eq!(game.spawn_progress(), 0.0);
        game.tick(pacing.start_speed / 2);
        assert!((game.spawn_progress() - 0.5).abs() < 1e-9);

        game.tick(pacing.start_speed / 2);
        let top = game.board().top_row();
        let tile = &game.board()[Coord::new(top, next.column)];
        assert_eq!(tile.value, next.value);
        assert!(tile.moving);
        assert_eq!(game.spawn_progress(), 0.0);
        assert!(game.next_spawn().is_some());
    }

    #[test]
    fn spawn_timing_keeps_leftover_time() {
        let pacing = PacingConfig::default();
        let mut game = GameState::new(GameMode::Endless, &board_config(8, 10), &pacing).unwrap();
        let before = filled(&game);

        // Half a second past the start delay counts toward the first spawn.
        game.tick(pacing.start_delay + Duration::from_millis(500));
        assert!((game.spawn_progress() - 0.5 / 3.0).abs() < 1e-9);
        game.tick(Duration::from_millis(2500));
        assert_eq!(filled(&game), before + 1);
        assert_eq!(game.spawn_progress(), 0.0);

        // A late frame carries its overshoot into the next interval.
        game.tick(Duration::from_millis(3400));
        assert!((game.spawn_progress() - 0.4 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn fidget_has_nothing_to_preview() {
        let pacing = PacingConfig::default();
        let mut game = GameState::new(GameMode::Fidget, &board_config(8, 10), &pacing).unwrap();
        assert_eq!(game.next_spawn(), None);
        game.tick(Duration::from_secs(30));
        assert_eq!(game.spawn_progress(), 0.0);
    }

    #[test]
    fn fidget_never_spawns() {
        let pacing = PacingConfig::default();
        let mut game = GameState::new(GameMode::Fidget, &board_config(8, 10), &pacing).unwrap();
        let before = filled(&game);
        for _ in 0..20 {
            game.tick(Duration::from_secs(5));
        }
        assert_eq!(filled(&game), before);
        assert!(!game.is_over());
    }

    #[test]
    fn overflow_ends_the_game() {
        let pacing = PacingConfig::default();
        let mut game = GameState::new(GameMode::Endless, &board_config(1, 3), &pacing).unwrap();
        set_row(&mut game, 0, &[1, 2, 3]);

        game.tick(pacing.start_delay);
        game.tick(pacing.start_speed);
        assert!(game.is_over());
        assert_eq!(game.board().to_rows(), vec![vec![1, 2, 3]]);
        assert!(!game.swap(Coord::new(0, 0), Coord::new(0, 1)));
    }

    #[test]
    fn swap_at_cursor_scores_and_flashes() {
        let pacing = PacingConfig::default();
        let mut game = GameState::new(GameMode::Fidget, &board_config(1, 4), &pacing).unwrap();
        set_row(&mut game, 0, &[1, 1, 2, 1]);
        game.move_cursor(Direction::Right);
        game.move_cursor(Direction::Right);
        assert_eq!(game.cursor(), Coord::new(0, 2));

        assert!(game.swap_at_cursor());
        assert_eq!(game.board().to_rows(), vec![vec![0, 0, 0, 2]]);
        assert_eq!(game.score().score(), 27);
        assert_eq!(game.take_flash().len(), 3);
        assert!(game.take_flash().is_empty());
    }

    #[test]
    fn speed_mode_quickens_after_enough_matches() {
        let pacing = PacingConfig {
            matches_until_speedup: 1,
            ..PacingConfig::default()
        };
        let mut game = GameState::new(GameMode::Speed, &board_config(1, 4), &pacing).unwrap();
        set_row(&mut game, 0, &[1, 1, 2, 1]);
        assert!(game.swap(Coord::new(0, 2), Coord::new(0, 3)));
        assert_eq!(game.pace(), Duration::from_millis(2900));

        // A second match inside the cooldown leaves the pace alone.
        set_row(&mut game, 0, &[3, 3, 1, 3]);
        assert!(game.swap(Coord::new(0, 2), Coord::new(0, 3)));
        assert_eq!(game.pace(), Duration::from_millis(2900));
    }

    #[test]
    fn cursor_stays_on_the_board() {
        let pacing = PacingConfig::default();
        let mut game = GameState::new(GameMode::Fidget, &board_config(2, 3), &pacing).unwrap();
        game.move_cursor(Direction::Left);
        game.move_cursor(Direction::Below);
        assert_eq!(game.cursor(), Coord::new(0, 0));
        for _ in 0..5 {
            game.move_cursor(Direction::Right);
            game.move_cursor(Direction::Above);
        }
        assert_eq!(game.cursor(), Coord::new(1, 1));
    }

    #[test]
    fn abandon_detaches_listeners() {
        let pacing = PacingConfig::default();
        let mut game = GameState::new(GameMode::Endless, &board_config(8, 10), &pacing).unwrap();
        game.abandon();
        assert!(game.is_over());
        assert!(!game.board().is_fall_propagation_attached());
    }
}
