use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use madori_ipc::{ReloadResult, StateEvent, ThemeColors};
use parking_lot::Mutex;

use super::backup::BackupManager;
use super::cache::ColorCache;
use super::loader::{read_theme, LoadedTheme, ThemeError};
use crate::effect::Effect;

#[derive(Debug)]
pub enum ReloadOutcome {
    /// New colours were cached; the effects propagate them to the host
    Applied {
        colors: Arc<ThemeColors>,
        effects: Vec<Effect>,
    },
    Unchanged,
    Failed(ThemeError),
}

impl ReloadOutcome {
    #[cfg(test)]
    pub fn effects(&self) -> &[Effect] {
        match self {
            ReloadOutcome::Applied { effects, .. } => effects,
            _ => &[],
        }
    }

    pub fn into_effects(self) -> Vec<Effect> {
        match self {
            ReloadOutcome::Applied { effects, .. } => effects,
            _ => Vec::new(),
        }
    }

    pub fn to_result(&self) -> ReloadResult {
        match self {
            ReloadOutcome::Applied { .. } => ReloadResult::Applied,
            ReloadOutcome::Unchanged => ReloadResult::Unchanged,
            ReloadOutcome::Failed(e) => ReloadResult::Failed {
                message: e.to_string(),
            },
        }
    }
}

/// Re-reads the theme file and decides whether anything downstream must happen.
///
/// Shared between the watcher thread and manual reload requests; `reload`
/// holds `in_flight` for the whole read-compare-replace sequence.
pub struct Reloader {
    path: PathBuf,
    cache: Arc<ColorCache>,
    backups: BackupManager,
    restart_grace: Duration,
    started_at: Instant,
    in_flight: Mutex<()>,
}

impl Reloader {
    pub fn new(
        path: PathBuf,
        cache: Arc<ColorCache>,
        backups: BackupManager,
        restart_grace: Duration,
    ) -> Self {
        Self {
            path,
            cache,
            backups,
            restart_grace,
            started_at: Instant::now(),
            in_flight: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn cache(&self) -> &Arc<ColorCache> {
        &self.cache
    }

    pub fn reload(&self) -> ReloadOutcome {
        let _guard = self.in_flight.lock();

        let loaded = match read_theme(&self.path) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!("Theme reload failed, keeping current colors: {}", e);
                return ReloadOutcome::Failed(e);
            }
        };

        if self.cache.hash().as_deref() == Some(loaded.hash.as_str()) {
            tracing::debug!("Theme file content unchanged, skipping reload");
            return ReloadOutcome::Unchanged;
        }

        if *self.cache.current() == loaded.colors {
            tracing::debug!("Theme file rewritten with identical colors");
            self.cache.set_hash(loaded.hash);
            return ReloadOutcome::Unchanged;
        }

        let LoadedTheme { colors, hash, raw } = loaded;
        let colors = self.cache.replace(colors, hash);
        tracing::info!(
            "Updated colors: background={} foreground={}",
            colors.special.background,
            colors.special.foreground
        );

        if let Err(e) = self.backups.create_backup(&raw) {
            tracing::warn!("Failed to back up theme file: {:#}", e);
        }

        let mut effects = vec![
            Effect::RegenerateAssets {
                colors: colors.clone(),
            },
            Effect::Broadcast(StateEvent::ThemeChanged {
                colors: Box::new((*colors).clone()),
            }),
        ];
        if self.started_at.elapsed() >= self.restart_grace {
            effects.push(Effect::RestartHost);
        } else {
            tracing::info!("Colors updated without restart (too soon after startup)");
        }

        ReloadOutcome::Applied { colors, effects }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::loader::test_support::{theme_json, write_theme};
    use madori_ipc::ThemeSource;

    struct Fixture {
        _dir: tempfile::TempDir,
        path: PathBuf,
        reloader: Reloader,
    }

    fn fixture(grace: Duration) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colors.json");
        write_theme(&path, 1);

        let backups = BackupManager::new(
            dir.path().join("backups"),
            dir.path().join("last_good.json"),
            10,
        );
        let initial = backups.load_initial(&path);
        let cache = Arc::new(ColorCache::new(
            initial.colors,
            initial.source,
            initial.hash,
        ));
        let reloader = Reloader::new(path.clone(), cache, backups, grace);
        Fixture {
            _dir: dir,
            path,
            reloader,
        }
    }

    fn seed_colors(seed: u8) -> ThemeColors {
        serde_json::from_str(&theme_json(seed)).unwrap()
    }

    #[test]
    fn test_changed_file_is_applied() {
        let f = fixture(Duration::ZERO);
        write_theme(&f.path, 2);

        let outcome = f.reloader.reload();
        assert_eq!(outcome.to_result(), ReloadResult::Applied);
        assert_eq!(*f.reloader.cache().current(), seed_colors(2));
        assert_eq!(f.reloader.cache().source(), ThemeSource::ThemeFile);

        let effects = outcome.effects();
        assert_eq!(effects.len(), 3);
        assert!(matches!(effects[0], Effect::RegenerateAssets { .. }));
        assert!(matches!(
            effects[1],
            Effect::Broadcast(StateEvent::ThemeChanged { .. })
        ));
        assert_eq!(effects[2], Effect::RestartHost);
    }

    #[test]
    fn test_identical_rewrite_fires_nothing() {
        let f = fixture(Duration::ZERO);
        write_theme(&f.path, 1);

        let outcome = f.reloader.reload();
        assert_eq!(outcome.to_result(), ReloadResult::Unchanged);
        assert!(outcome.effects().is_empty());
    }

    #[test]
    fn test_reformatted_file_with_same_colors_fires_nothing() {
        let f = fixture(Duration::ZERO);
        let pretty = serde_json::to_string_pretty(&seed_colors(1)).unwrap();
        std::fs::write(&f.path, pretty).unwrap();

        let outcome = f.reloader.reload();
        assert_eq!(outcome.to_result(), ReloadResult::Unchanged);
        assert!(outcome.effects().is_empty());

        // The new bytes are remembered, so the next identical check is cheap
        assert_eq!(
            f.reloader.cache().hash(),
            crate::theme::loader::file_hash(&f.path)
        );
    }

    #[test]
    fn test_truncated_json_keeps_cache() {
        let f = fixture(Duration::ZERO);
        let before = f.reloader.cache().current();

        let json = theme_json(3);
        std::fs::write(&f.path, &json[..json.len() - 20]).unwrap();

        let outcome = f.reloader.reload();
        assert!(matches!(outcome, ReloadOutcome::Failed(ThemeError::Parse { .. })));
        assert!(outcome.effects().is_empty());
        assert_eq!(f.reloader.cache().current(), before);
    }

    #[test]
    fn test_missing_special_keeps_cache() {
        let f = fixture(Duration::ZERO);
        let before = f.reloader.cache().current();

        std::fs::write(&f.path, theme_json(3).replace("special", "spatial")).unwrap();

        let outcome = f.reloader.reload();
        assert!(matches!(outcome, ReloadOutcome::Failed(_)));
        assert_eq!(*f.reloader.cache().current(), *before);

        // A later valid write recovers
        write_theme(&f.path, 4);
        assert_eq!(f.reloader.reload().to_result(), ReloadResult::Applied);
        assert_eq!(*f.reloader.cache().current(), seed_colors(4));
    }

    #[test]
    fn test_rapid_writes_end_with_final_content() {
        let f = fixture(Duration::ZERO);
        write_theme(&f.path, 7);
        write_theme(&f.path, 8);

        f.reloader.reload();
        assert_eq!(*f.reloader.cache().current(), seed_colors(8));
        assert_eq!(f.reloader.reload().to_result(), ReloadResult::Unchanged);
    }

    #[test]
    fn test_restart_suppressed_during_grace_period() {
        let f = fixture(Duration::from_secs(3600));
        write_theme(&f.path, 2);

        let effects = f.reloader.reload().into_effects();
        assert_eq!(effects.len(), 2);
        assert!(!effects.contains(&Effect::RestartHost));
    }

    #[test]
    fn test_applied_theme_is_backed_up() {
        let f = fixture(Duration::ZERO);
        write_theme(&f.path, 2);
        f.reloader.reload();

        let last_good = f.path.with_file_name("last_good.json");
        assert_eq!(std::fs::read_to_string(last_good).unwrap(), theme_json(2));
    }

    #[test]
    fn test_concurrent_reloads_apply_once() {
        let f = fixture(Duration::ZERO);
        write_theme(&f.path, 9);

        let reloader = Arc::new(f.reloader);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reloader = reloader.clone();
                std::thread::spawn(move || reloader.reload().to_result())
            })
            .collect();
        let results: Vec<ReloadResult> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let applied = results
            .iter()
            .filter(|r| **r == ReloadResult::Applied)
            .count();
        assert_eq!(applied, 1);
        assert_eq!(*reloader.cache().current(), seed_colors(9));
    }
}
