use madori_ipc::WatchState;

use crate::theme::ReloadOutcome;

/// Notifications from watcher threads to the dispatcher loop.
#[derive(Debug)]
pub enum Event {
    ThemeReloaded(ReloadOutcome),
    WatchStateChanged(WatchState),
}
