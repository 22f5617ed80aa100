//! App: terminal init, main loop, tick and key handling.

use crate::highscores::{self, HighScores};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, View};
use crate::{Args, SessionConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use matchtui::{Coord, Direction, GameMode, GameState};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    MainMenu,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::MainMenu,
            Self::MainMenu => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::MainMenu => Self::Resume,
            Self::Exit => Self::MainMenu,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTab {
    Mode,
    Start,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub current_tab: MenuTab,
    pub selected_mode: GameMode,
}

impl MenuState {
    fn new(mode: GameMode) -> Self {
        Self {
            current_tab: MenuTab::Mode,
            selected_mode: mode,
        }
    }

    /// Apply a menu key. Returns the mode to start when Start is confirmed.
    fn apply(&mut self, action: Action) -> Option<GameMode> {
        match action {
            Action::MoveUp | Action::MoveDown => {
                self.current_tab = match self.current_tab {
                    MenuTab::Mode => MenuTab::Start,
                    MenuTab::Start => MenuTab::Mode,
                };
            }
            Action::MoveLeft if self.current_tab == MenuTab::Mode => {
                self.selected_mode = self.selected_mode.prev();
            }
            Action::MoveRight if self.current_tab == MenuTab::Mode => {
                self.selected_mode = self.selected_mode.next();
            }
            Action::Swap => match self.current_tab {
                MenuTab::Mode => self.current_tab = MenuTab::Start,
                MenuTab::Start => return Some(self.selected_mode),
            },
            _ => {}
        }
        None
    }
}

/// Cells cleared by recent matches: drawn white, then faded to the background.
#[derive(Default)]
pub struct Flash {
    pub cells: Vec<Coord>,
    pub effect: Option<Effect>,
    pub process_time: Option<Instant>,
}

pub struct App {
    args: Args,
    config: SessionConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    menu_state: MenuState,
    quit_selected: QuitOption,
    high_scores: HighScores,
    new_high_score: bool,
    flash: Flash,
    last_frame: Instant,
}

impl App {
    pub fn new(args: Args, config: SessionConfig, theme: Theme) -> Result<Self> {
        let state = GameState::new(args.mode, &config.board, &config.pacing)?;
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        Ok(Self {
            menu_state: MenuState::new(args.mode),
            args,
            config,
            theme,
            state,
            screen,
            paused: false,
            quit_selected: QuitOption::Resume,
            high_scores: highscores::load_high_scores(),
            new_high_score: false,
            flash: Flash::default(),
            last_frame: Instant::now(),
        })
    }

    /// Replace the session with a fresh board in `mode`.
    fn start_game(&mut self, mode: GameMode) -> Result<()> {
        self.state.abandon();
        self.state = GameState::new(mode, &self.config.board, &self.config.pacing)?;
        self.screen = Screen::Playing;
        self.paused = false;
        self.new_high_score = false;
        self.flash = Flash::default();
        Ok(())
    }

    fn finish_game(&mut self) {
        self.screen = Screen::GameOver;
        let score = self.state.score().score();
        self.new_high_score = self.high_scores.record(self.state.mode(), score);
        if !self.new_high_score {
            return;
        }
        if let Err(e) = highscores::save_high_scores(&self.high_scores) {
            warn!(error = %e, "could not save high scores");
        }
    }

    /// Pick up cells cleared since the last frame and restart the fade over them.
    fn collect_flash(&mut self) {
        let cleared = self.state.take_flash();
        if cleared.is_empty() || self.args.no_animation {
            return;
        }
        self.flash.cells.extend(cleared);
        self.flash.effect = None;
        self.flash.process_time = None;
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal =
            DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        self.last_frame = Instant::now();

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            let dt = now.saturating_duration_since(self.last_frame);
            self.last_frame = now;

            if self.screen == Screen::Playing && !self.paused {
                self.state.tick(dt);
                self.collect_flash();
                if self.state.is_over() {
                    self.finish_game();
                }
            }

            let view = View {
                screen: self.screen,
                state: &self.state,
                theme: &self.theme,
                paused: self.paused,
                menu: &self.menu_state,
                quit_selected: self.quit_selected,
                best: self.high_scores.get(self.state.mode()),
                new_high_score: self.new_high_score,
            };
            let flash = &mut self.flash;
            terminal.draw(|f| ui::draw(f, &view, flash, now))?;

            if self.flash.effect.as_ref().is_some_and(|e| e.done()) {
                self.flash = Flash::default();
            }

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_action(key_to_action(key))? {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Returns true when the app should exit.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match self.screen {
            Screen::Menu => {
                if action == Action::Quit {
                    return Ok(true);
                }
                if let Some(mode) = self.menu_state.apply(action) {
                    self.start_game(mode)?;
                }
            }
            Screen::Playing if self.paused => match action {
                Action::Pause => self.paused = false,
                Action::Quit => self.open_quit_menu(),
                _ => {}
            },
            Screen::Playing => match action {
                Action::MoveLeft => self.state.move_cursor(Direction::Left),
                Action::MoveRight => self.state.move_cursor(Direction::Right),
                Action::MoveUp => self.state.move_cursor(Direction::Above),
                Action::MoveDown => self.state.move_cursor(Direction::Below),
                Action::Swap => {
                    self.state.swap_at_cursor();
                    self.collect_flash();
                }
                Action::Pause => self.paused = true,
                Action::Restart => self.start_game(self.state.mode())?,
                Action::Quit => self.open_quit_menu(),
                Action::None => {}
            },
            Screen::QuitMenu => match action {
                Action::MoveDown | Action::MoveRight => {
                    self.quit_selected = self.quit_selected.next();
                }
                Action::MoveUp | Action::MoveLeft => {
                    self.quit_selected = self.quit_selected.prev();
                }
                Action::Swap => match self.quit_selected {
                    QuitOption::Resume => self.resume(),
                    QuitOption::MainMenu => {
                        self.state.abandon();
                        self.flash = Flash::default();
                        self.menu_state = MenuState::new(self.state.mode());
                        self.screen = Screen::Menu;
                    }
                    QuitOption::Exit => return Ok(true),
                },
                Action::Quit | Action::Pause => self.resume(),
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Quit => return Ok(true),
                Action::Restart | Action::Swap => self.start_game(self.state.mode())?,
                _ => {}
            },
        }
        Ok(false)
    }

    fn open_quit_menu(&mut self) {
        self.quit_selected = QuitOption::Resume;
        self.screen = Screen::QuitMenu;
    }

    fn resume(&mut self) {
        self.screen = Screen::Playing;
    }
}
