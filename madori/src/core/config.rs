use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use madori_ipc::FloatRule;
use serde::{Deserialize, Serialize};

use super::FloatingRules;
use crate::platform::RestartMethod;
use crate::theme::{AssetTemplate, WatchMode, WatcherOptions};

const CONFIG_FILE_NAME: &str = "config.json";

/// Daemon configuration. Every field has a default, so an empty JSON object
/// (or no config file at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme_file: PathBuf,
    pub backup_dir: PathBuf,
    pub last_good_file: PathBuf,
    pub max_backups: usize,
    pub watch_mode: WatchMode,
    pub poll_interval_ms: u64,
    pub coalesce_ms: u64,
    pub restart_grace_secs: u64,
    pub restart: RestartMethod,
    pub assets: Vec<AssetTemplate>,
    pub force_floating_apps: Vec<String>,
    pub floating_rules: Vec<FloatRule>,
}

impl Default for Config {
    fn default() -> Self {
        let wal_dir = cache_dir().join("wal");
        Self {
            theme_file: wal_dir.join("colors.json"),
            backup_dir: wal_dir.join("backups"),
            last_good_file: wal_dir.join("last_good_colors.json"),
            max_backups: 10,
            watch_mode: WatchMode::Auto,
            poll_interval_ms: 1000,
            coalesce_ms: 200,
            restart_grace_secs: 30,
            restart: RestartMethod::Event,
            assets: Vec::new(),
            force_floating_apps: default_force_floating_apps(),
            floating_rules: default_floating_rules(),
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/madori/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("madori").join(CONFIG_FILE_NAME))
    }

    /// Load from an explicit path (which must exist), or from the default
    /// location if present, or fall back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(p) => p,
                None => {
                    tracing::info!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut config: Config = serde_json::from_str(text)?;
        config.expand_paths();
        Ok(config)
    }

    fn expand_paths(&mut self) {
        self.theme_file = expand_home(&self.theme_file);
        self.backup_dir = expand_home(&self.backup_dir);
        self.last_good_file = expand_home(&self.last_good_file);
        for asset in &mut self.assets {
            asset.template = expand_home(&asset.template);
            asset.output = expand_home(&asset.output);
        }
    }

    pub fn floating_rules(&self) -> FloatingRules {
        FloatingRules::with_rules(
            self.force_floating_apps.clone(),
            self.floating_rules.clone(),
        )
    }

    pub fn watcher_options(&self) -> WatcherOptions {
        WatcherOptions {
            path: self.theme_file.clone(),
            mode: self.watch_mode,
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(10)),
            coalesce: Duration::from_millis(self.coalesce_ms),
        }
    }

    pub fn restart_grace(&self) -> Duration {
        Duration::from_secs(self.restart_grace_secs)
    }
}

fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_force_floating_apps() -> Vec<String> {
    [
        "nm-connection-editor",
        "pavucontrol",
        "origin.exe",
        "steam",
        "blueman-manager",
        "arandr",
        "lxappearance",
        "qt5ct",
        "kvantummanager",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_floating_rules() -> Vec<FloatRule> {
    let classes = [
        // System dialogs
        "confirm",
        "download",
        "error",
        "file_progress",
        "notification",
        "splash",
        "toolbar",
        // PIN entry and authentication
        "pinentry-gtk-2",
        "pinentry",
        "ssh-askpass",
        // gitk
        "confirmreset",
        "makebranch",
        "maketag",
        "krunner",
        // Small tools
        "gnome-calculator",
        "kcalc",
        "galculator",
        "flameshot",
        "spectacle",
        "org.kde.spectacle",
        "xfce4-screenshooter",
        "gpick",
    ];
    let titles = ["pinentry", "branchdialog", "Desktop — Plasma"];

    classes
        .into_iter()
        .map(FloatRule::wm_class)
        .chain(titles.into_iter().map(FloatRule::title))
        .collect()
}
