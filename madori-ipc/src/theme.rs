use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const PALETTE_SIZE: usize = 16;

/// A `#rrggbb` colour, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn parse(value: &str) -> Result<Self, String> {
        let valid = value.len() == 7
            && value.starts_with('#')
            && value[1..].chars().all(|c| c.is_ascii_hexdigit());
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(format!("invalid colour '{}', expected #rrggbb", value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digits without the leading '#'
    pub fn strip(&self) -> &str {
        &self.0[1..]
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The 16 indexed palette entries, `color0` through `color15`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Color>",
    into = "BTreeMap<String, Color>"
)]
pub struct Palette([Color; PALETTE_SIZE]);

impl Palette {
    pub fn get(&self, index: usize) -> Option<&Color> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.0.iter()
    }
}

impl TryFrom<BTreeMap<String, Color>> for Palette {
    type Error = String;

    fn try_from(mut map: BTreeMap<String, Color>) -> Result<Self, Self::Error> {
        let mut entries = Vec::with_capacity(PALETTE_SIZE);
        for i in 0..PALETTE_SIZE {
            let key = format!("color{}", i);
            let color = map
                .remove(&key)
                .ok_or_else(|| format!("missing palette entry '{}'", key))?;
            entries.push(color);
        }
        let entries: [Color; PALETTE_SIZE] = entries
            .try_into()
            .map_err(|_| "palette must have 16 entries".to_string())?;
        Ok(Self(entries))
    }
}

impl From<Palette> for BTreeMap<String, Color> {
    fn from(palette: Palette) -> Self {
        palette
            .0
            .into_iter()
            .enumerate()
            .map(|(i, c)| (format!("color{}", i), c))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialColors {
    pub background: Color,
    pub foreground: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Color>,
}

/// Parsed theme file (pywal/wallust `colors.json` layout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallpaper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<String>,
    pub special: SpecialColors,
    pub colors: Palette,
}

impl ThemeColors {
    /// Look up a colour or metadata value by template name
    /// (`background`, `foreground`, `cursor`, `color0`..`color15`, `wallpaper`, `alpha`).
    pub fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "background" => Some(self.special.background.as_str()),
            "foreground" => Some(self.special.foreground.as_str()),
            "cursor" => Some(
                self.special
                    .cursor
                    .as_ref()
                    .unwrap_or(&self.special.foreground)
                    .as_str(),
            ),
            "wallpaper" => self.wallpaper.as_deref(),
            "alpha" => self.alpha.as_deref(),
            _ => {
                let index: usize = name.strip_prefix("color")?.parse().ok()?;
                self.colors.get(index).map(Color::as_str)
            }
        }
    }

    /// Built-in palette used when neither the theme file nor any backup loads.
    pub fn fallback() -> Self {
        const PALETTE: [&str; PALETTE_SIZE] = [
            "#1e1e1e", "#e06c75", "#98c379", "#e5c07b", "#61afef", "#c678dd", "#56b6c2",
            "#ffffff", "#5c6370", "#e06c75", "#98c379", "#e5c07b", "#61afef", "#c678dd",
            "#56b6c2", "#ffffff",
        ];
        Self {
            wallpaper: None,
            alpha: Some("100".to_string()),
            special: SpecialColors {
                background: Color("#1e1e1e".to_string()),
                foreground: Color("#ffffff".to_string()),
                cursor: Some(Color("#ffffff".to_string())),
            },
            colors: Palette(PALETTE.map(|c| Color(c.to_string()))),
        }
    }
}

/// Watcher lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    #[default]
    Idle,
    Watching,
    ReloadPending,
    Reloading,
}

impl std::fmt::Display for WatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Watching => "watching",
            Self::ReloadPending => "reload-pending",
            Self::Reloading => "reloading",
        };
        f.write_str(s)
    }
}

/// Where the cached colours came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThemeSource {
    ThemeFile,
    LastGood,
    Backup { name: String },
    Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeStatus {
    pub path: String,
    pub state: WatchState,
    pub mode: String,
    pub source: ThemeSource,
    pub background: String,
    pub foreground: String,
    pub last_reload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadResult {
    Applied,
    Unchanged,
    Failed { message: String },
}
