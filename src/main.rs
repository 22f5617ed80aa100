//! matchtui — match-3 falling-tile puzzle in the terminal.

mod app;
mod highscores;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use matchtui::{BoardConfig, GameMode, PacingConfig};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Board and pacing settings for every session started by the app.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub board: BoardConfig,
    pub pacing: PacingConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path, args.log_level)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = args.session_config();
    config.board.validate().context("invalid board settings")?;
    config.pacing.validate().context("invalid pacing settings")?;
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// A terminal UI owns stdout and stderr, so logs only go to a file when asked for.
fn init_logging(path: &Path, level: LogLevel) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level.as_tracing())
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install logger: {e}"))
}

/// Match-3 falling-tile puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "matchtui",
    version,
    about = "Match-3 falling-tile puzzle in the terminal. Swap tiles to line up three of a kind before the board fills.",
    long_about = "matchtui is a terminal match-3 puzzle.\n\n\
        Tiles drop in from the top and fall until they land. Swap two neighbouring tiles to \
        line up a run of equal tiles; the run clears and everything above it falls. The game \
        ends when a new tile has nowhere to land.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor    Space / Enter  Swap\n  P              Pause          R              Restart\n  Q / Esc        Quit\n\n\
        MODES:\n  endless  steady pace    speed  pace quickens with matches    fidget  no new tiles\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Game mode: endless (steady pace), speed (pace quickens with matches), or fidget (no new tiles).
    #[arg(short, long, default_value = "endless")]
    pub mode: GameMode,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Board height in rows.
    #[arg(long, default_value = "8", value_name = "ROWS")]
    pub rows: usize,

    /// Board width in columns.
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub columns: usize,

    /// Number of distinct tile types (at least 3).
    #[arg(long, default_value = "4", value_name = "N")]
    pub tile_types: usize,

    /// Tiles in a row needed for a match.
    #[arg(long, default_value = "3", value_name = "N")]
    pub match_length: usize,

    /// Rows filled with tiles when a game starts.
    #[arg(long, default_value = "3", value_name = "ROWS")]
    pub fill_rows: usize,

    /// Initial time between new tiles, in ms.
    #[arg(long, default_value = "3000", value_name = "MS")]
    pub start_speed_ms: u64,

    /// Shortest time between new tiles the speed mode may reach, in ms.
    #[arg(long, default_value = "500", value_name = "MS")]
    pub max_speed_ms: u64,

    /// Each speed-up shortens the interval by start speed / this factor.
    #[arg(long, default_value = "30.0", value_name = "F")]
    pub speed_factor: f32,

    /// Matches needed for one speed-up in speed mode.
    #[arg(long, default_value = "10", value_name = "N")]
    pub matches_until_speedup: u32,

    /// Minimum time between two speed-ups, in ms.
    #[arg(long, default_value = "2000", value_name = "MS")]
    pub speed_up_cooldown_ms: u64,

    /// Grace period before the first tile drops, in ms.
    #[arg(long, default_value = "5000", value_name = "MS")]
    pub start_delay_ms: u64,

    /// Seed for tile generation; random when not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Disable the match flash animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Write engine logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log verbosity when --log-file is set.
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            board: BoardConfig {
                rows: self.rows,
                columns: self.columns,
                tiles_required_to_match: self.match_length,
                distinct_tile_types: self.tile_types,
                default_row_fill_count: self.fill_rows,
                seed: self.seed,
            },
            pacing: PacingConfig {
                start_speed: Duration::from_millis(self.start_speed_ms),
                max_speed: Duration::from_millis(self.max_speed_ms),
                speed_factor: self.speed_factor,
                matches_until_speedup: self.matches_until_speedup,
                speed_up_cooldown: Duration::from_millis(self.speed_up_cooldown_ms),
                start_delay: Duration::from_millis(self.start_delay_ms),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_tracing(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_engine_defaults() {
        let args = Args::parse_from(["matchtui"]);
        let config = args.session_config();
        assert_eq!(
            config.board,
            BoardConfig {
                seed: None,
                ..BoardConfig::default()
            }
        );
        assert_eq!(config.pacing, PacingConfig::default());
        assert_eq!(args.mode, GameMode::Endless);
    }

    #[test]
    fn flags_reach_the_session_config() {
        let args = Args::parse_from([
            "matchtui",
            "--mode",
            "speed",
            "--rows",
            "6",
            "--columns",
            "7",
            "--seed",
            "99",
            "--start-speed-ms",
            "1500",
        ]);
        let config = args.session_config();
        assert_eq!(args.mode, GameMode::Speed);
        assert_eq!((config.board.rows, config.board.columns), (6, 7));
        assert_eq!(config.board.seed, Some(99));
        assert_eq!(config.pacing.start_speed, Duration::from_millis(1500));
    }
}
