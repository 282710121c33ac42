use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use madori_ipc::{ThemeColors, ThemeSource};

use super::assets::write_atomic;
use super::loader::{file_hash, read_theme};

const BACKUP_PREFIX: &str = "colors_";
const BACKUP_SUFFIX: &str = ".json";

/// Keeps timestamped copies of every theme that was applied, plus a
/// "last good" copy used when the live theme file is broken at startup.
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: PathBuf,
    last_good_file: PathBuf,
    max_backups: usize,
}

/// Result of the startup load chain.
#[derive(Debug, Clone)]
pub struct InitialTheme {
    pub colors: ThemeColors,
    pub source: ThemeSource,
    pub hash: Option<String>,
}

impl BackupManager {
    pub fn new(backup_dir: PathBuf, last_good_file: PathBuf, max_backups: usize) -> Self {
        Self {
            backup_dir,
            last_good_file,
            max_backups: max_backups.max(1),
        }
    }

    #[cfg(test)]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    #[cfg(test)]
    pub fn last_good_file(&self) -> &Path {
        &self.last_good_file
    }

    /// Store the raw bytes of a theme that was just parsed and applied in
    /// the backup directory and as the last-good file, then prune old backups.
    pub fn create_backup(&self, content: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.backup_dir).with_context(|| {
            format!(
                "Failed to create backup directory {}",
                self.backup_dir.display()
            )
        })?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S%3f");
        let backup_file = self
            .backup_dir
            .join(format!("{}{}{}", BACKUP_PREFIX, timestamp, BACKUP_SUFFIX));
        std::fs::write(&backup_file, content)
            .with_context(|| format!("Failed to write backup {}", backup_file.display()))?;

        write_atomic(&self.last_good_file, content).with_context(|| {
            format!(
                "Failed to update last good colors {}",
                self.last_good_file.display()
            )
        })?;

        self.prune();
        tracing::debug!("Created theme backup: {}", backup_file.display());
        Ok(backup_file)
    }

    /// Backup file names, oldest first.
    pub fn backups(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.backup_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX))
            .collect();
        names.sort();
        names
    }

    fn prune(&self) {
        let names = self.backups();
        if names.len() <= self.max_backups {
            return;
        }
        let excess = names.len() - self.max_backups;
        for name in &names[..excess] {
            let path = self.backup_dir.join(name);
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to remove old backup {}: {}", path.display(), e);
            }
        }
    }

    /// Load the startup palette: theme file, then last good copy, then the
    /// newest readable backup, then built-in defaults.
    pub fn load_initial(&self, theme_file: &Path) -> InitialTheme {
        match read_theme(theme_file) {
            Ok(loaded) => {
                tracing::info!("Loaded colors from {}", theme_file.display());
                if file_hash(&self.last_good_file).as_ref() != Some(&loaded.hash) {
                    if let Err(e) = self.create_backup(&loaded.raw) {
                        tracing::warn!("Failed to back up theme file: {:#}", e);
                    }
                }
                return InitialTheme {
                    colors: loaded.colors,
                    source: ThemeSource::ThemeFile,
                    hash: Some(loaded.hash),
                };
            }
            Err(e) => tracing::warn!("Could not load theme file: {}", e),
        }

        match read_theme(&self.last_good_file) {
            Ok(loaded) => {
                tracing::info!("Loaded colors from last good copy");
                return InitialTheme {
                    colors: loaded.colors,
                    source: ThemeSource::LastGood,
                    hash: None,
                };
            }
            Err(e) => tracing::debug!("No usable last good colors: {}", e),
        }

        for name in self.backups().iter().rev() {
            match read_theme(&self.backup_dir.join(name)) {
                Ok(loaded) => {
                    tracing::info!("Loaded colors from backup {}", name);
                    return InitialTheme {
                        colors: loaded.colors,
                        source: ThemeSource::Backup { name: name.clone() },
                        hash: None,
                    };
                }
                Err(e) => tracing::debug!("Skipping unusable backup {}: {}", name, e),
            }
        }

        tracing::warn!("Using default colors");
        InitialTheme {
            colors: ThemeColors::fallback(),
            source: ThemeSource::Defaults,
            hash: None,
        }
    }
}
