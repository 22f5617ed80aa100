//! Layout and drawing: menu, board, sidebar, pause, quit menu, game over.

use crate::app::{Flash, MenuState, MenuTab, QuitOption, Screen};
use crate::theme::Theme;
use matchtui::{Board, Coord, Direction as BoardDirection, GameMode, GameState, NextSpawn, Tile};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{CellFilter, Duration as TfxDuration, EffectRenderer, Interpolation, fx, ref_count};

/// Each board cell is two terminal columns wide so tiles look square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 26;
/// Height of the sidebar sections stacked together.
const SIDEBAR_HEIGHT: u16 = 20;
/// Duration of the match flash fade (TachyonFX) in ms.
const FLASH_FADE_MS: u32 = 350;

/// Everything the renderer reads for one frame.
pub struct View<'a> {
    pub screen: Screen,
    pub state: &'a GameState,
    pub theme: &'a Theme,
    pub paused: bool,
    pub menu: &'a MenuState,
    pub quit_selected: QuitOption,
    pub best: u64,
    pub new_high_score: bool,
}

/// A board count in terminal cells, clamped to what a terminal can address.
fn cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Playfield size in terminal cells (border + grid) for a board.
fn playfield_size(board: &Board) -> (u16, u16) {
    let w = cells(board.columns()).saturating_mul(CELL_WIDTH);
    let h = cells(board.rows());
    (w.saturating_add(2), h.saturating_add(2))
}

/// Split `area` into the centred playfield and the sidebar next to it.
fn game_areas(area: Rect, board: &Board) -> (Rect, Rect) {
    let (pw, ph) = playfield_size(board);
    let total_w = pw.saturating_add(SIDEBAR_WIDTH);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph.max(SIDEBAR_HEIGHT)),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let playfield = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    (playfield, inner[1])
}

/// Board cells only, inside the playfield border.
fn board_rect(playfield: Rect) -> Rect {
    Rect {
        x: playfield.x + 1,
        y: playfield.y + 1,
        width: playfield.width.saturating_sub(2),
        height: playfield.height.saturating_sub(2),
    }
}

/// Screen position of a board cell. Row 0 is the bottom row of the board.
fn cell_origin(rect: Rect, board: &Board, c: Coord) -> (u16, u16) {
    let x = rect.x.saturating_add(cells(c.col).saturating_mul(CELL_WIDTH));
    let y = rect.y.saturating_add(cells(board.rows() - 1 - c.row));
    (x, y)
}

/// Buffer (x, y) positions covered by the flashing cells.
fn flash_buffer_positions(rect: Rect, board: &Board, cells: &[Coord]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &c in cells {
        let (x0, y) = cell_origin(rect, board, c);
        for x in x0..x0.saturating_add(CELL_WIDTH).min(rect.right()) {
            if y < rect.bottom() {
                set.insert((x, y));
            }
        }
    }
    set
}

/// Create or advance the flash fade (TachyonFX: cleared cells fade from white to bg).
fn apply_flash_effect(frame: &mut Frame, view: &View, area: Rect, flash: &mut Flash, now: Instant) {
    let board = view.state.board();
    let rect = board_rect(game_areas(area, board).0);
    let delta = flash
        .process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    flash.process_time = Some(now);

    if flash.effect.is_none() {
        let positions = flash_buffer_positions(rect, board, &flash.cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let bg = view.theme.bg;
        let effect = fx::fade_to(bg, bg, (FLASH_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(rect);
        flash.effect = Some(effect);
    }

    if let Some(effect) = &mut flash.effect {
        frame.render_effect(effect, rect, TfxDuration::from_millis(delta_ms));
    }
}

/// Draw the current screen. While cells are flashing, advances the fade in `flash`.
pub fn draw(frame: &mut Frame, view: &View, flash: &mut Flash, now: Instant) {
    let area = frame.area();
    match view.screen {
        Screen::Menu => draw_menu(frame, view, area),
        Screen::Playing => {
            draw_game(frame, view, area, &flash.cells);
            if view.paused {
                draw_pause_overlay(frame, view.theme, area);
            }
            if !flash.cells.is_empty() {
                apply_flash_effect(frame, view, area, flash, now);
            }
        }
        Screen::QuitMenu => {
            draw_game(frame, view, area, &[]);
            draw_quit_menu(frame, view.theme, view.quit_selected);
        }
        Screen::GameOver => {
            draw_game(frame, view, area, &[]);
            draw_game_over(frame, view, area);
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn bold(style: Style) -> Style {
    style.add_modifier(Modifier::BOLD)
}

fn draw_menu(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let popup = centered(area, 48, 18);
    let highlight = bold(Style::default().fg(Color::Black).bg(theme.tiles[1]));
    let selected = bold(Style::default().fg(theme.tiles[1]));
    let normal = Style::default().fg(theme.main_fg);

    let title = Line::from(vec![
        Span::styled(" match ", bold(Style::default().fg(theme.tiles[2]))),
        Span::styled(" tui ", bold(Style::default().fg(theme.main_fg))),
    ]);

    let mut modes = Vec::new();
    for (i, mode) in GameMode::ALL.into_iter().enumerate() {
        if i > 0 {
            modes.push(Span::from("  "));
        }
        let style = if view.menu.current_tab == MenuTab::Mode && view.menu.selected_mode == mode {
            highlight
        } else if view.menu.selected_mode == mode {
            selected
        } else {
            normal
        };
        modes.push(Span::styled(
            format!(" {} ", mode.label().to_uppercase()),
            style,
        ));
    }

    let blurb = match view.menu.selected_mode {
        GameMode::Endless => "New tiles drop at a steady pace",
        GameMode::Speed => "The pace quickens as you match",
        GameMode::Fidget => "No new tiles, swap at leisure",
    };
    let start_style = if view.menu.current_tab == MenuTab::Start {
        highlight
    } else {
        normal
    };
    let board = view.state.board();
    let accent = Style::default().fg(theme.tiles[3]);

    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(Span::styled(
            format!(
                " Board {}×{}  ·  {} types  ·  match {} ",
                board.columns(),
                board.rows(),
                board.distinct_tile_types(),
                board.tiles_required_to_match()
            ),
            Style::default().fg(theme.inactive_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(" ─ MODE ─ ", Style::default().fg(theme.div_line))),
        Line::from(modes),
        Line::from(Span::styled(blurb, Style::default().fg(theme.inactive_fg))),
        Line::from(""),
        Line::from(Span::styled(" [ START ] ", start_style)),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↕ ", accent),
            Span::from("NAVIGATE   "),
            Span::styled(" ↔ ", accent),
            Span::from("CHANGE   "),
            Span::styled(" ENTER ", accent),
            Span::from("START"),
        ]),
        Line::from(""),
        Line::from(Span::styled(" [Q] QUIT ", Style::default().fg(theme.tiles[2]))),
    ];

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P: Resume    Q: Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let score = view.state.score();
    let popup = centered(area, 30, 11);
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", score.score()), fg)),
        Line::from(Span::styled(format!(" Best: {} ", view.best), fg)),
        Line::from(Span::styled(
            format!(" Matches: {} ", score.total_matches()),
            fg,
        )),
    ];
    if view.new_high_score {
        lines.push(Line::from(Span::styled(
            " New best! ",
            bold(Style::default().fg(theme.title)),
        )));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R: Restart    Q: Quit ",
        Style::default().fg(theme.inactive_fg),
    )));
    Clear.render(popup, frame.buffer_mut());
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

/// Draw game: playfield + sidebar, centred in the full area.
fn draw_game(frame: &mut Frame, view: &View, area: Rect, flashing: &[Coord]) {
    let (playfield, sidebar) = game_areas(area, view.state.board());
    draw_playfield(frame, view, playfield, flashing);
    draw_sidebar(frame, view, sidebar);
}

/// Symbol and style for one board cell.
fn cell_look(theme: &Theme, tile: &Tile, flashing: bool) -> (&'static str, Style) {
    if flashing {
        return ("██", Style::default().fg(Color::White).bg(theme.bg));
    }
    let style = Style::default().fg(theme.tile_color(tile.value)).bg(theme.bg);
    if tile.is_filled() {
        (if tile.moving { "▓▓" } else { "██" }, style)
    } else if tile.is_blocked() {
        ("╳╳", style)
    } else {
        ("· ", Style::default().fg(theme.inactive_fg).bg(theme.bg))
    }
}

fn draw_playfield(frame: &mut Frame, view: &View, area: Rect, flashing: &[Coord]) {
    let theme = view.theme;
    let state = view.state;
    let board = state.board();
    let title = format!(" matchtui  {} ", state.mode().label());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, theme.title));
    let rect = board_rect(area);
    block.render(area, frame.buffer_mut());

    let flash: HashSet<Coord> = flashing.iter().copied().collect();
    let cursor = state.cursor();
    let cursor_pair = board.neighbor(cursor, BoardDirection::Right);
    let buf = frame.buffer_mut();

    for c in board.coords() {
        let (x, y) = cell_origin(rect, board, c);
        if x.saturating_add(CELL_WIDTH) > rect.right() || y >= rect.bottom() {
            continue;
        }
        let tile = &board[c];
        let (mut symbol, mut style) = cell_look(theme, tile, flash.contains(&c));
        let under_cursor = c == cursor || Some(c) == cursor_pair;
        if under_cursor && !state.is_over() {
            symbol = if c == cursor { "[▪" } else { "▪]" };
            let fg = if tile.is_filled() {
                theme.tile_color(tile.value)
            } else {
                theme.main_fg
            };
            style = bold(Style::default().fg(fg).bg(theme.div_line));
        }
        buf.set_string(x, y, symbol, style);
    }

    if let Some(next) = state.next_spawn().filter(|_| !state.is_over()) {
        let (x, _) = cell_origin(rect, board, Coord::new(board.top_row(), next.column));
        if x.saturating_add(CELL_WIDTH) <= rect.right() {
            let style = Style::default().fg(theme.tile_color(next.value)).bg(theme.bg);
            buf.set_string(x, area.y, next_marker(state.spawn_progress()), style);
        }
    }
}

/// Marker in the top border over the column the next tile drops into. Darkens as the
/// spawn comes due.
fn next_marker(progress: f64) -> &'static str {
    if progress < 1.0 / 3.0 {
        "░░"
    } else if progress < 2.0 / 3.0 {
        "▒▒"
    } else {
        "▓▓"
    }
}

fn sidebar_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let state = view.state;
    let score = state.score();
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Score, best, matches, tiles
            Constraint::Length(5), // Pace, falling
            Constraint::Length(4), // Next tile
            Constraint::Length(4), // Tile colours
            Constraint::Length(1), // Status line
        ])
        .split(area);

    let stats = vec![
        stat("Score: ", score.score().to_string()),
        stat("Best: ", view.best.max(score.score()).to_string()),
        stat("Matches: ", score.total_matches().to_string()),
        stat("Tiles: ", score.matched_tiles().to_string()),
    ];
    let block = sidebar_block(theme);
    let inner = block.inner(chunks[0]);
    block.render(chunks[0], frame.buffer_mut());
    Paragraph::new(stats).render(inner, frame.buffer_mut());

    let pace = if state.mode().spawns_tiles() {
        format!("{:.2}s", state.pace().as_secs_f64())
    } else {
        "off".to_string()
    };
    let pace_lines = vec![
        stat("Pace: ", pace),
        stat(
            "Fall: ",
            format!("{:.2}s", state.board().pacing().drop_delay().as_secs_f64()),
        ),
        stat(
            "Falling: ",
            format!("{} ({} live)", state.falling_count(), state.live_drops()),
        ),
    ];
    let block = sidebar_block(theme);
    let inner = block.inner(chunks[1]);
    block.render(chunks[1], frame.buffer_mut());
    Paragraph::new(pace_lines).render(inner, frame.buffer_mut());

    draw_next_preview(frame, view, chunks[2]);

    let block = sidebar_block(theme);
    let inner = block.inner(chunks[3]);
    block.render(chunks[3], frame.buffer_mut());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    Paragraph::new(Line::from(Span::styled("Tiles", title_style)))
        .render(rows[0], frame.buffer_mut());
    draw_colour_strip(frame, theme, state.board().distinct_tile_types(), rows[1]);

    let status = if state.mode().spawns_tiles() && !state.start_delay_left().is_zero() {
        Span::styled(
            format!(" Starting in {}s", state.start_delay_left().as_secs() + 1),
            bold(Style::default().fg(theme.tiles[1])),
        )
    } else {
        Span::styled(" ←↑↓→ move  ␣ swap", Style::default().fg(theme.inactive_fg))
    };
    Paragraph::new(Line::from(status)).render(chunks[4], frame.buffer_mut());
}

/// Next tile: its colour and column, with a bar filling up until it drops.
fn draw_next_preview(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let block = sidebar_block(theme);
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let title = Span::styled("Next: ", Style::default().fg(theme.title));
    let Some(NextSpawn { column, value }) = view.state.next_spawn() else {
        let line = Line::from(vec![
            title,
            Span::styled("none", Style::default().fg(theme.inactive_fg)),
        ]);
        Paragraph::new(line).render(rows[0], frame.buffer_mut());
        return;
    };
    let colour = theme.tile_color(value);
    let line = Line::from(vec![
        title,
        Span::styled("██", Style::default().fg(colour).bg(theme.bg)),
        Span::styled(format!(" col {}", column + 1), Style::default().fg(theme.main_fg)),
    ]);
    Paragraph::new(line).render(rows[0], frame.buffer_mut());

    let gauge = Gauge::default()
        .ratio(view.state.spawn_progress().clamp(0.0, 1.0))
        .gauge_style(Style::default().fg(colour));
    gauge.render(rows[1], frame.buffer_mut());
}

/// Draw one coloured block per tile type in play.
fn draw_colour_strip(frame: &mut Frame, theme: &Theme, types: usize, area: Rect) {
    for value in 1..=types {
        let x = area.x.saturating_add(cells(value - 1).saturating_mul(CELL_WIDTH));
        if x.saturating_add(CELL_WIDTH) > area.right() {
            break;
        }
        let c = theme.tile_color(value as i32);
        frame
            .buffer_mut()
            .set_string(x, area.y, "██", Style::default().fg(c).bg(theme.bg));
    }
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let area = frame.area();
    let quit_rect = centered(area, 24, 8);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    Clear.render(quit_rect, frame.buffer_mut());
    for y in quit_rect.y..quit_rect.bottom() {
        for x in quit_rect.x..quit_rect.right() {
            frame.buffer_mut()[(x, y)].set_style(Style::default().bg(theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::MainMenu, " Main Menu "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            bold(Style::default().fg(theme.bg).bg(theme.title))
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchtui::BoardConfig;

    fn board(rows: usize, columns: usize) -> Board {
        let config = BoardConfig {
            rows,
            columns,
            default_row_fill_count: 1,
            seed: Some(1),
            ..BoardConfig::default()
        };
        Board::new(&config).unwrap()
    }

    #[test]
    fn bottom_row_is_drawn_last() {
        let board = board(4, 3);
        let rect = Rect::new(10, 5, 6, 4);
        assert_eq!(cell_origin(rect, &board, Coord::new(0, 0)), (10, 8));
        assert_eq!(cell_origin(rect, &board, Coord::new(3, 2)), (14, 5));
    }

    #[test]
    fn flash_covers_both_columns_of_a_cell() {
        let board = board(2, 2);
        let rect = Rect::new(0, 0, 4, 2);
        let set = flash_buffer_positions(rect, &board, &[Coord::new(1, 1)]);
        assert_eq!(set, HashSet::from([(2, 0), (3, 0)]));
    }

    #[test]
    fn playfield_includes_border() {
        assert_eq!(playfield_size(&board(8, 10)), (22, 10));
    }

    #[test]
    fn oversized_boards_clamp_to_the_terminal_range() {
        let board = board(2, 40_000);
        assert_eq!(playfield_size(&board), (u16::MAX, 4));
        let rect = Rect::new(10, 0, 100, 2);
        assert_eq!(cell_origin(rect, &board, Coord::new(0, 39_999)), (u16::MAX, 1));
        let (playfield, _) = game_areas(Rect::new(0, 0, 80, 24), &board);
        assert!(playfield.width <= 80);
    }

    #[test]
    fn next_marker_darkens_toward_the_spawn() {
        assert_eq!(next_marker(0.0), "░░");
        assert_eq!(next_marker(0.5), "▒▒");
        assert_eq!(next_marker(0.9), "▓▓");
        assert_eq!(next_marker(1.0), "▓▓");
    }

    #[test]
    fn sidebar_shows_the_next_tile() {
        use matchtui::PacingConfig;
        use ratatui::{Terminal, backend::TestBackend};

        let config = BoardConfig {
            seed: Some(3),
            ..BoardConfig::default()
        };
        let state = GameState::new(GameMode::Endless, &config, &PacingConfig::default()).unwrap();
        let next = state.next_spawn().unwrap();
        let theme = Theme::default();
        let menu = MenuState {
            current_tab: MenuTab::Mode,
            selected_mode: GameMode::Endless,
        };
        let view = View {
            screen: Screen::Playing,
            state: &state,
            theme: &theme,
            paused: false,
            menu: &menu,
            quit_selected: QuitOption::Resume,
            best: 0,
            new_high_score: false,
        };
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut flash = Flash::default();
        terminal
            .draw(|f| draw(f, &view, &mut flash, Instant::now()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains(&format!("Next: ██ col {}", next.column + 1)));
        assert!(text.contains("░░"));
    }
}
