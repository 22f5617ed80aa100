//! Persist best scores per game mode (XDG config or ~/.config/matchtui).

use anyhow::Result;
use matchtui::GameMode;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

const FILENAME: &str = "highscores";

/// Best score for each mode, stored one per line in [`GameMode::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScores {
    best: [u64; 3],
}

impl HighScores {
    fn slot(mode: GameMode) -> usize {
        match mode {
            GameMode::Endless => 0,
            GameMode::Speed => 1,
            GameMode::Fidget => 2,
        }
    }

    pub fn get(&self, mode: GameMode) -> u64 {
        self.best[Self::slot(mode)]
    }

    /// Keep `score` if it beats the best for `mode`. Returns whether it did.
    pub fn record(&mut self, mode: GameMode, score: u64) -> bool {
        let best = &mut self.best[Self::slot(mode)];
        if score > *best {
            *best = score;
            true
        } else {
            false
        }
    }

    /// Missing or unparsable lines count as 0.
    fn parse(content: &str) -> Self {
        let mut scores = Self::default();
        for (slot, line) in content.lines().take(scores.best.len()).enumerate() {
            scores.best[slot] = line.trim().parse().unwrap_or(0);
        }
        scores
    }
}

/// Returns the path to the high scores file (config dir / matchtui / highscores).
fn config_path() -> PathBuf {
    let home_config = || {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => home_config(),
    };
    base.join("matchtui").join(FILENAME)
}

/// Load high scores from disk; all zero when the file is missing.
pub fn load_high_scores() -> HighScores {
    fs::read_to_string(config_path())
        .map(|content| HighScores::parse(&content))
        .unwrap_or_default()
}

/// Save high scores to disk. Creates the config directory if needed.
pub fn save_high_scores(scores: &HighScores) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    for best in scores.best {
        writeln!(f, "{best}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tolerates_short_and_bad_files() {
        let scores = HighScores::parse("120\nnot a number\n");
        assert_eq!(scores.get(GameMode::Endless), 120);
        assert_eq!(scores.get(GameMode::Speed), 0);
        assert_eq!(scores.get(GameMode::Fidget), 0);
    }

    #[test]
    fn record_keeps_only_improvements() {
        let mut scores = HighScores::default();
        assert!(scores.record(GameMode::Speed, 50));
        assert!(!scores.record(GameMode::Speed, 40));
        assert!(!scores.record(GameMode::Speed, 50));
        assert_eq!(scores.get(GameMode::Speed), 50);
        assert_eq!(scores.get(GameMode::Endless), 0);
    }
}
