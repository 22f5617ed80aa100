//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Number of distinct tile colours; boards with more types reuse them cyclically.
pub const TILE_COLORS: usize = 7;

/// One Dark tile and UI colours, optionally overridden from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Tile colours for values 1..=7: green, yellow, red, blue, magenta, cyan, orange.
    pub tiles: [Color; TILE_COLORS],
    /// Blocked cells.
    pub blocked: Color,
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, pace).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Empty-cell dots and secondary text.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

const ONEDARK_TILES: [Color; TILE_COLORS] = [
    rgb(0x0098_C379),
    rgb(0x00E5_C07B),
    rgb(0x00E0_6C75),
    rgb(0x0061_AFEF),
    rgb(0x00C6_78DD),
    rgb(0x0056_B6C2),
    rgb(0x00D1_9A66),
];

impl Theme {
    /// Hardcoded One Dark defaults, the hex values of onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            tiles: ONEDARK_TILES,
            blocked: rgb(0x004B_5263),
            bg: rgb(0x0031_353F),
            div_line: rgb(0x003F_444F),
            main_fg: rgb(0x00AB_B2BF),
            title: rgb(0x00E5_C07B),
            inactive_fg: rgb(0x005C_6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override tile colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.tiles = [
                    rgb(0x0000_FF00),
                    rgb(0x00FF_FF00),
                    rgb(0x00FF_0000),
                    rgb(0x0000_88FF),
                    rgb(0x00FF_00FF),
                    rgb(0x0000_FFFF),
                    rgb(0x00FF_8800),
                ];
                self.blocked = rgb(0x0080_8080);
            }
            Palette::Colorblind => {
                // Paul Tol's vibrant scheme plus grey.
                self.tiles = [
                    rgb(0x0000_77BB),
                    rgb(0x00EE_7733),
                    rgb(0x0000_9988),
                    rgb(0x00CC_3311),
                    rgb(0x00EE_3377),
                    rgb(0x00BB_BB00),
                    rgb(0x0033_BBEE),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let d = Self::onedark_default();
        Self {
            tiles: [
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.tiles[0]),
                get("cpu_mid").or_else(|| get("title")).unwrap_or(d.tiles[1]),
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.tiles[2]),
                get("cpu_box").unwrap_or(d.tiles[3]),
                get("net_box").unwrap_or(d.tiles[4]),
                get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(d.tiles[5]),
                get("temp_mid").or_else(|| get("download_mid")).unwrap_or(d.tiles[6]),
            ],
            blocked: get("inactive_fg").unwrap_or(d.blocked),
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    /// Colour for a tile type (1-based). Blocked and empty cells have their own colours.
    pub fn tile_color(&self, value: i32) -> Color {
        match value {
            v if v > 0 => self.tiles[(v as usize - 1) % TILE_COLORS],
            v if v < 0 => self.blocked,
            _ => self.bg,
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
