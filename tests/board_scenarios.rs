//! Board scenarios through the public API: swaps, falls, cascades and overflow.

use matchtui::{
    Board, BoardConfig, BoardEvent, Coord, DropScheduler, EventKind, GameMode, GameState,
    PacingConfig,
};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(50);

fn config() -> BoardConfig {
    BoardConfig {
        default_row_fill_count: 0,
        seed: Some(2024),
        ..BoardConfig::default()
    }
}

/// Board from rows listed top first, with a 1s spawn pace (200ms per fall step).
fn board(rows: &[&[i32]]) -> Board {
    let mut board = Board::from_rows(&config(), rows).unwrap();
    board.setup_speed(Duration::from_secs(1));
    board
}

fn kinds(events: &[BoardEvent]) -> Vec<EventKind> {
    events.iter().map(BoardEvent::kind).collect()
}

#[test]
fn test_dropped_tile_completes_a_row() {
    let mut board = board(&[&[0, 0, 0], &[0, 0, 0], &[0, 1, 1]]);
    let events = board.subscribe_to(&[EventKind::MatchesFound]);
    let mut scheduler = DropScheduler::new();

    assert!(board.place_tile(1, Coord::new(2, 0), true));
    assert!(board[Coord::new(2, 0)].moving);
    assert!(scheduler.run_until_settled(&mut board, TICK, 1_000));

    assert_eq!(board.to_rows(), vec![vec![0, 0, 0]; 3]);
    assert_eq!(
        events.drain(),
        vec![BoardEvent::MatchesFound(vec![
            Coord::new(0, 0),
            Coord::new(0, 1),
            Coord::new(0, 2),
        ])]
    );
}

#[test]
fn test_swap_match_drops_the_row_above() {
    let mut board = board(&[&[0, 0, 0], &[3, 1, 4], &[1, 2, 1]]);
    let events = board.subscribe();
    let mut scheduler = DropScheduler::new();

    assert!(board.swap_tiles(Coord::new(0, 1), Coord::new(1, 1), false));
    let seen = kinds(&events.drain());
    let matched = seen.iter().position(|k| *k == EventKind::MatchesFound);
    let swapped = seen.iter().position(|k| *k == EventKind::TilesSwapped);
    assert!(matched.is_some() && matched < swapped, "events: {seen:?}");

    assert_eq!(board.falling_tiles().len(), 3);
    assert!(scheduler.run_until_settled(&mut board, TICK, 1_000));
    assert_eq!(
        board.to_rows(),
        vec![vec![0, 0, 0], vec![0, 0, 0], vec![3, 2, 4]]
    );
}

#[test]
fn test_refused_swap_changes_nothing() {
    let mut board = board(&[&[0, 0, 0], &[0, 0, 0], &[1, 2, 1]]);
    let events = board.subscribe();
    assert!(!board.swap_tiles(Coord::new(1, 0), Coord::new(1, 1), false));
    assert!(!board.swap_tiles(Coord::new(0, 0), Coord::new(0, 7), false));
    assert!(events.drain().is_empty());
    assert_eq!(board.to_rows()[2], vec![1, 2, 1]);
}

#[test]
fn test_full_top_row_overflows() {
    let mut board = board(&[&[1, 2, 1]]);
    let events = board.subscribe_to(&[EventKind::Overflow]);
    assert!(!board.place_row(&[2, 2, 2]));
    assert_eq!(events.drain(), vec![BoardEvent::Overflow]);
    assert_eq!(board.to_rows(), vec![vec![1, 2, 1]]);
}

#[test]
fn test_detached_board_no_longer_propagates_falls() {
    let mut board = board(&[&[0, 2, 0], &[1, 1, 1]]);
    let events = board.subscribe();
    board.detach_listeners();
    assert!(!board.is_fall_propagation_attached());

    let cleared = board.resolve_matches(Coord::new(0, 0), None, false);
    assert_eq!(cleared.len(), 3);
    assert!(!board[Coord::new(1, 1)].moving);
    assert!(events.try_next().is_none());
}

#[test]
fn test_unsubscribed_listener_hears_nothing() {
    let mut board = board(&[&[0, 0, 0], &[1, 2, 1]]);
    let kept = board.subscribe();
    let dropped = board.subscribe();
    assert!(board.unsubscribe(dropped.id()));
    assert!(!board.unsubscribe(dropped.id()));

    board.place_tile(3, Coord::new(1, 0), false);
    assert!(dropped.try_next().is_none());
    assert_eq!(kinds(&kept.drain()), vec![EventKind::Changed]);
}

fn quick_pacing() -> PacingConfig {
    PacingConfig {
        start_speed: Duration::from_secs(1),
        start_delay: Duration::ZERO,
        ..PacingConfig::default()
    }
}

#[test]
fn test_endless_game_ends_when_a_column_overflows() {
    let config = BoardConfig {
        rows: 2,
        columns: 1,
        ..config()
    };
    let mut game = GameState::new(GameMode::Endless, &config, &quick_pacing()).unwrap();

    for _ in 0..1_000 {
        if game.is_over() {
            break;
        }
        game.tick(Duration::from_millis(100));
    }
    assert!(game.is_over());
    assert!(game.board().to_rows().iter().all(|row| row[0] > 0));

    let elapsed = game.elapsed();
    game.tick(Duration::from_secs(5));
    assert_eq!(game.elapsed(), elapsed);
}

#[test]
fn test_fidget_game_never_spawns() {
    let config = BoardConfig {
        default_row_fill_count: 2,
        ..config()
    };
    let mut game = GameState::new(GameMode::Fidget, &config, &quick_pacing()).unwrap();
    let before = game.board().to_rows();
    for _ in 0..200 {
        game.tick(Duration::from_millis(100));
    }
    assert_eq!(game.board().to_rows(), before);
    assert!(!game.is_over());
}
