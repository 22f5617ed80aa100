//! Board and pacing configuration.
//!
//! Both structs are plain data with product defaults; [`BoardConfig::validate`] and
//! [`PacingConfig::validate`] reject values the engine cannot work with.

use std::time::Duration;
use thiserror::Error;

/// Fewer types than this and a match-free random fill may not exist: a cell can have
/// one value excluded by its left pair and another by the pair below it.
pub const MIN_DISTINCT_TILE_TYPES: usize = 3;

/// Shortest run the scoring and the match-free fill are defined for.
pub const MIN_TILES_TO_MATCH: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("board must have at least one row and one column, got {rows}x{columns}")]
    EmptyBoard { rows: usize, columns: usize },
    #[error("tiles required to match must be at least {MIN_TILES_TO_MATCH}, got {0}")]
    MatchLengthTooShort(usize),
    #[error("need at least {MIN_DISTINCT_TILE_TYPES} distinct tile types, got {0}")]
    TooFewTileTypes(usize),
    #[error("cannot fill {rows} rows on a board {height} rows high")]
    FillRowsExceedBoard { rows: usize, height: usize },
    #[error("row data is ragged: row {row} has {len} values, expected {expected}")]
    RaggedRows { row: usize, len: usize, expected: usize },
    #[error("invalid pacing: {0}")]
    InvalidPacing(&'static str),
}

/// Shape and rules of a board, fixed for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub rows: usize,
    pub columns: usize,
    pub tiles_required_to_match: usize,
    pub distinct_tile_types: usize,
    /// Rows filled by [`crate::Board::fill_default`] at the start of a session.
    pub default_row_fill_count: usize,
    /// Seed for the board's RNG; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            columns: 10,
            tiles_required_to_match: 3,
            distinct_tile_types: 4,
            default_row_fill_count: 3,
            seed: None,
        }
    }
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ConfigError::EmptyBoard {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.tiles_required_to_match < MIN_TILES_TO_MATCH {
            return Err(ConfigError::MatchLengthTooShort(self.tiles_required_to_match));
        }
        if self.distinct_tile_types < MIN_DISTINCT_TILE_TYPES {
            return Err(ConfigError::TooFewTileTypes(self.distinct_tile_types));
        }
        if self.default_row_fill_count > self.rows {
            return Err(ConfigError::FillRowsExceedBoard {
                rows: self.default_row_fill_count,
                height: self.rows,
            });
        }
        Ok(())
    }
}

/// Timing knobs for a session. Speeds are spawn intervals, so "faster" means shorter.
#[derive(Debug, Clone, PartialEq)]
pub struct PacingConfig {
    /// Initial time between spawns.
    pub start_speed: Duration,
    /// Shortest spawn interval the speed ramp may reach.
    pub max_speed: Duration,
    /// Each speed-up shortens the interval by `start_speed / speed_factor`.
    pub speed_factor: f32,
    pub matches_until_speedup: u32,
    /// Minimum time between two speed-ups.
    pub speed_up_cooldown: Duration,
    /// Grace period before the first spawn.
    pub start_delay: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            start_speed: Duration::from_secs(3),
            max_speed: Duration::from_millis(500),
            speed_factor: 30.0,
            matches_until_speedup: 10,
            speed_up_cooldown: Duration::from_secs(2),
            start_delay: Duration::from_secs(5),
        }
    }
}

impl PacingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_speed.is_zero() {
            return Err(ConfigError::InvalidPacing("start speed must be positive"));
        }
        if self.max_speed > self.start_speed {
            return Err(ConfigError::InvalidPacing(
                "max speed interval must not exceed the start interval",
            ));
        }
        if !self.speed_factor.is_finite() || self.speed_factor <= 0.0 {
            return Err(ConfigError::InvalidPacing("speed factor must be a positive number"));
        }
        if self.matches_until_speedup == 0 {
            return Err(ConfigError::InvalidPacing("matches until speed-up must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(BoardConfig::default().validate(), Ok(()));
        assert_eq!(PacingConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_degenerate_boards() {
        let cfg = BoardConfig {
            rows: 0,
            ..BoardConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::EmptyBoard { rows: 0, columns: 10 })
        );

        let cfg = BoardConfig {
            tiles_required_to_match: 2,
            ..BoardConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::MatchLengthTooShort(2)));

        let cfg = BoardConfig {
            distinct_tile_types: 2,
            ..BoardConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::TooFewTileTypes(2)));

        let cfg = BoardConfig {
            rows: 2,
            default_row_fill_count: 3,
            ..BoardConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::FillRowsExceedBoard { rows: 3, height: 2 })
        );
    }

    #[test]
    fn small_boards_are_allowed() {
        let cfg = BoardConfig {
            rows: 1,
            columns: 5,
            default_row_fill_count: 1,
            ..BoardConfig::default()
        };
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn rejects_inverted_pacing() {
        let cfg = PacingConfig {
            max_speed: Duration::from_secs(10),
            ..PacingConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidPacing(_))));

        let cfg = PacingConfig {
            speed_factor: 0.0,
            ..PacingConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidPacing(_))));
    }
}
