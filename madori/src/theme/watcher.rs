use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use anyhow::{bail, Context, Result};
use madori_ipc::WatchState;
use notify::RecommendedWatcher;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult, Debouncer};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::reload::Reloader;
use crate::event::Event;

const SHUTDOWN_CHECK_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchMode {
    /// notify when it can be set up, polling otherwise
    #[default]
    Auto,
    Notify,
    Poll,
}

#[derive(Debug, Clone)]
pub struct WatcherOptions {
    pub path: PathBuf,
    pub mode: WatchMode,
    pub poll_interval: Duration,
    pub coalesce: Duration,
}

type Fingerprint = Option<(SystemTime, u64)>;

enum Backend {
    Notify(Debouncer<RecommendedWatcher>),
    Poll {
        shutdown: Arc<AtomicBool>,
        handle: JoinHandle<()>,
    },
}

impl Backend {
    fn label(&self) -> &'static str {
        match self {
            Backend::Notify(_) => "notify",
            Backend::Poll { .. } => "poll",
        }
    }
}

struct Shared {
    path: PathBuf,
    coalesce: Duration,
    reloader: Arc<Reloader>,
    state: Mutex<WatchState>,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl Shared {
    fn set_state(&self, next: WatchState) {
        self.transition(next, false);
    }

    /// Like `set_state`, but a stopped watcher stays stopped.
    fn advance(&self, next: WatchState) {
        self.transition(next, true);
    }

    fn transition(&self, next: WatchState, keep_idle: bool) {
        let mut state = self.state.lock();
        if *state == next || (keep_idle && *state == WatchState::Idle) {
            return;
        }
        *state = next;
        tracing::debug!("Theme watcher state: {}", next);
        // Sent under the lock so subscribers see transitions in order
        let _ = self.event_tx.send(Event::WatchStateChanged(next));
    }

    fn reload(&self) {
        self.advance(WatchState::Reloading);
        let outcome = self.reloader.reload();
        let _ = self.event_tx.send(Event::ThemeReloaded(outcome));
        self.advance(WatchState::Watching);
    }
}

/// Watches the theme file and drives reloads through the shared [`Reloader`].
pub struct ThemeWatcher {
    options: WatcherOptions,
    shared: Arc<Shared>,
    backend: Option<Backend>,
}

impl ThemeWatcher {
    pub fn new(
        options: WatcherOptions,
        reloader: Arc<Reloader>,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> Self {
        let shared = Arc::new(Shared {
            path: options.path.clone(),
            coalesce: options.coalesce,
            reloader,
            state: Mutex::new(WatchState::Idle),
            event_tx,
        });
        Self {
            options,
            shared,
            backend: None,
        }
    }

    pub fn state(&self) -> WatchState {
        *self.shared.state.lock()
    }

    /// Backend in use, or "none" while idle.
    pub fn mode(&self) -> &'static str {
        self.backend.as_ref().map(Backend::label).unwrap_or("none")
    }

    pub fn start(&mut self) -> Result<()> {
        if self.backend.is_some() {
            tracing::debug!("Theme watcher already running");
            return Ok(());
        }

        let backend = match self.options.mode {
            WatchMode::Poll => self.start_poll()?,
            WatchMode::Notify => Backend::Notify(self.start_notify()?),
            WatchMode::Auto => match self.start_notify() {
                Ok(debouncer) => Backend::Notify(debouncer),
                Err(e) => {
                    tracing::warn!("File notifications unavailable, polling instead: {:#}", e);
                    self.start_poll()?
                }
            },
        };

        tracing::info!(
            "Watching {} ({})",
            self.options.path.display(),
            backend.label()
        );
        self.backend = Some(backend);
        self.shared.set_state(WatchState::Watching);
        Ok(())
    }

    pub fn stop(&mut self) {
        let Some(backend) = self.backend.take() else {
            return;
        };
        // Mark idle first so an in-progress callback cannot move us back to Watching
        self.shared.set_state(WatchState::Idle);
        match backend {
            Backend::Notify(debouncer) => drop(debouncer),
            Backend::Poll { shutdown, handle } => {
                shutdown.store(true, Ordering::Relaxed);
                if handle.join().is_err() {
                    tracing::error!("Theme poll thread panicked");
                }
            }
        }
        tracing::info!("Stopped watching {}", self.options.path.display());
    }

    fn watch_dir(&self) -> Result<PathBuf> {
        let dir = match self.options.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create theme directory {}", dir.display()))?;
        Ok(dir)
    }

    fn start_notify(&self) -> Result<Debouncer<RecommendedWatcher>> {
        let dir = self.watch_dir()?.canonicalize()?;
        let Some(file_name) = self.options.path.file_name().map(|n| n.to_os_string()) else {
            bail!("Theme path {} has no file name", self.options.path.display());
        };

        let shared = self.shared.clone();
        let mut debouncer = new_debouncer(self.options.coalesce, move |res: DebounceEventResult| {
            match res {
                Ok(events) => {
                    let touched = events
                        .iter()
                        .any(|e| e.path.file_name() == Some(file_name.as_os_str()));
                    if touched {
                        tracing::debug!("Theme file change detected");
                        shared.advance(WatchState::ReloadPending);
                        shared.reload();
                    }
                }
                Err(e) => tracing::error!("Theme watcher error: {}", e),
            }
        })
        .context("Failed to create file watcher")?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        Ok(debouncer)
    }

    fn start_poll(&self) -> Result<Backend> {
        self.watch_dir()?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shared = self.shared.clone();
        let interval = self.options.poll_interval;
        let flag = shutdown.clone();
        let handle = thread::Builder::new()
            .name("theme-poll".to_string())
            .spawn(move || poll_loop(shared, interval, flag))
            .context("Failed to spawn theme poll thread")?;
        Ok(Backend::Poll { shutdown, handle })
    }
}

impl Drop for ThemeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn fingerprint(path: &Path) -> Fingerprint {
    let metadata = std::fs::metadata(path).ok()?;
    Some((metadata.modified().ok()?, metadata.len()))
}

/// Sleep for `duration`; returns false as soon as shutdown is requested.
fn sleep_unless_shutdown(duration: Duration, shutdown: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(SHUTDOWN_CHECK_INTERVAL));
    }
}

fn poll_loop(shared: Arc<Shared>, interval: Duration, shutdown: Arc<AtomicBool>) {
    let mut last = fingerprint(&shared.path);
    while sleep_unless_shutdown(interval, &shutdown) {
        if fingerprint(&shared.path) == last {
            continue;
        }
        shared.advance(WatchState::ReloadPending);
        if !sleep_unless_shutdown(shared.coalesce, &shutdown) {
            break;
        }
        // Taken before reading so a write during the reload is seen next round
        last = fingerprint(&shared.path);
        shared.reload();
    }
    tracing::debug!("Theme poll thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::backup::BackupManager;
    use crate::theme::cache::ColorCache;
    use crate::theme::loader::test_support::{theme_json, write_theme};
    use crate::theme::ReloadOutcome;
    use madori_ipc::{ThemeColors, ThemeSource};

    struct Fixture {
        _dir: tempfile::TempDir,
        path: PathBuf,
        cache: Arc<ColorCache>,
        watcher: ThemeWatcher,
        event_rx: mpsc::UnboundedReceiver<Event>,
    }

    fn fixture(mode: WatchMode) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal").join("colors.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
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
        let reloader = Arc::new(Reloader::new(
            path.clone(),
            cache.clone(),
            backups,
            Duration::ZERO,
        ));
        let options = WatcherOptions {
            path: path.clone(),
            mode,
            poll_interval: Duration::from_millis(20),
            coalesce: Duration::from_millis(20),
        };
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let watcher = ThemeWatcher::new(options, reloader, event_tx);
        Fixture {
            _dir: dir,
            path,
            cache,
            watcher,
            event_rx,
        }
    }

    fn seed_colors(seed: u8) -> ThemeColors {
        serde_json::from_str(&theme_json(seed)).unwrap()
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        cond()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_start_and_stop_transitions() {
        let mut f = fixture(WatchMode::Poll);
        assert_eq!(f.watcher.state(), WatchState::Idle);
        assert_eq!(f.watcher.mode(), "none");

        f.watcher.start().unwrap();
        assert_eq!(f.watcher.state(), WatchState::Watching);
        assert_eq!(f.watcher.mode(), "poll");

        // Starting twice is harmless
        f.watcher.start().unwrap();

        f.watcher.stop();
        assert_eq!(f.watcher.state(), WatchState::Idle);

        let states: Vec<WatchState> = drain(&mut f.event_rx)
            .into_iter()
            .filter_map(|e| match e {
                Event::WatchStateChanged(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![WatchState::Watching, WatchState::Idle]);
    }

    #[test]
    fn test_poll_picks_up_change() {
        let mut f = fixture(WatchMode::Poll);
        f.watcher.start().unwrap();

        thread::sleep(Duration::from_millis(30));
        write_theme(&f.path, 2);

        assert!(wait_until(|| *f.cache.current() == seed_colors(2)));
        assert!(wait_until(|| f.watcher.state() == WatchState::Watching));
        assert_eq!(f.cache.source(), ThemeSource::ThemeFile);

        let events = drain(&mut f.event_rx);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::ThemeReloaded(ReloadOutcome::Applied { .. })
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::WatchStateChanged(WatchState::ReloadPending))));
    }

    #[test]
    fn test_rapid_writes_settle_on_final_content() {
        let mut f = fixture(WatchMode::Poll);
        f.watcher.start().unwrap();

        thread::sleep(Duration::from_millis(30));
        write_theme(&f.path, 2);
        write_theme(&f.path, 3);

        assert!(wait_until(|| *f.cache.current() == seed_colors(3)));
        assert!(wait_until(|| f.watcher.state() == WatchState::Watching));
    }

    #[test]
    fn test_malformed_write_keeps_watching() {
        let mut f = fixture(WatchMode::Poll);
        f.watcher.start().unwrap();

        thread::sleep(Duration::from_millis(30));
        let json = theme_json(4);
        std::fs::write(&f.path, &json[..json.len() - 10]).unwrap();

        assert!(wait_until(|| drain(&mut f.event_rx)
            .iter()
            .any(|e| matches!(e, Event::ThemeReloaded(ReloadOutcome::Failed(_))))));
        assert!(wait_until(|| f.watcher.state() == WatchState::Watching));
        assert_eq!(*f.cache.current(), seed_colors(1));

        // The loop is still alive
        write_theme(&f.path, 5);
        assert!(wait_until(|| *f.cache.current() == seed_colors(5)));
    }

    #[test]
    fn test_missing_directory_is_created() {
        let mut f = fixture(WatchMode::Poll);
        let nested = f.path.parent().unwrap().join("nested").join("colors.json");
        f.watcher.options.path = nested.clone();
        f.watcher.start().unwrap();
        assert!(nested.parent().unwrap().is_dir());
    }

    #[test]
    fn test_auto_mode_starts() {
        let mut f = fixture(WatchMode::Auto);
        f.watcher.start().unwrap();
        assert_eq!(f.watcher.state(), WatchState::Watching);
        assert!(matches!(f.watcher.mode(), "notify" | "poll"));
        f.watcher.stop();
        assert_eq!(f.watcher.state(), WatchState::Idle);
    }

    #[test]
    fn test_stopped_watcher_stays_idle_under_concurrent_callbacks() {
        let mut f = fixture(WatchMode::Poll);
        let shared = f.watcher.shared.clone();
        let done = Arc::new(AtomicBool::new(false));

        let callback = {
            let shared = shared.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    shared.advance(WatchState::Reloading);
                    shared.advance(WatchState::Watching);
                }
            })
        };

        let mut revived = 0;
        for _ in 0..2000 {
            shared.set_state(WatchState::Watching);
            shared.set_state(WatchState::Idle);
            if *shared.state.lock() != WatchState::Idle {
                revived += 1;
            }
        }
        done.store(true, Ordering::Relaxed);
        callback.join().unwrap();

        assert_eq!(revived, 0);
        let last = drain(&mut f.event_rx)
            .into_iter()
            .filter_map(|e| match e {
                Event::WatchStateChanged(s) => Some(s),
                _ => None,
            })
            .last();
        assert_eq!(last, Some(WatchState::Idle));
    }

    #[test]
    fn test_notify_picks_up_rapid_writes() {
        let mut f = fixture(WatchMode::Notify);
        f.watcher.start().unwrap();
        assert_eq!(f.watcher.mode(), "notify");

        write_theme(&f.path, 2);
        write_theme(&f.path, 3);

        assert!(wait_until(|| *f.cache.current() == seed_colors(3)));
        assert!(wait_until(|| f.watcher.state() == WatchState::Watching));

        let events = drain(&mut f.event_rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::WatchStateChanged(WatchState::ReloadPending))));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::ThemeReloaded(ReloadOutcome::Applied { .. })
        )));

        f.watcher.stop();
        assert_eq!(f.watcher.state(), WatchState::Idle);
    }

    #[test]
    fn test_notify_ignores_other_files_in_directory() {
        let mut f = fixture(WatchMode::Notify);
        f.watcher.start().unwrap();

        let sibling = f.path.with_file_name("sequences");
        std::fs::write(&sibling, theme_json(7)).unwrap();
        thread::sleep(Duration::from_millis(200));

        let reloads = drain(&mut f.event_rx)
            .into_iter()
            .filter(|e| matches!(e, Event::ThemeReloaded(_)))
            .count();
        assert_eq!(reloads, 0);
        assert_eq!(*f.cache.current(), seed_colors(1));
    }
}
