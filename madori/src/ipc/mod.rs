mod client;
mod event_server;
mod server;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::net::UnixListener;

pub use client::{subscribe_and_print, IpcClient};
pub use event_server::{EventBroadcaster, EventServer, SnapshotRequest};
pub use server::{IpcCommandWithResponse, IpcServer};

const SOCKET_NAME: &str = "madori.sock";
const EVENT_SOCKET_NAME: &str = "madori-events.sock";

fn runtime_dir() -> PathBuf {
    dirs::runtime_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Command socket, under `$XDG_RUNTIME_DIR` when set.
pub fn socket_path() -> PathBuf {
    runtime_dir().join(SOCKET_NAME)
}

pub fn event_socket_path() -> PathBuf {
    runtime_dir().join(EVENT_SOCKET_NAME)
}

/// Bind a listener at `path`, replacing a socket left behind by a previous run.
fn bind_socket(path: &Path) -> Result<UnixListener> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove stale socket {}", path.display()))?;
    }
    UnixListener::bind(path).with_context(|| format!("Failed to bind {}", path.display()))
}
