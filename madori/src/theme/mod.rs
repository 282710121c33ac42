mod assets;
mod backup;
mod cache;
mod loader;
mod reload;
mod watcher;

pub use assets::{render_all, AssetTemplate};
pub use backup::BackupManager;
pub use cache::ColorCache;
pub use reload::{ReloadOutcome, Reloader};
pub use watcher::{ThemeWatcher, WatchMode, WatcherOptions};

#[cfg(test)]
pub(crate) use loader::test_support;
