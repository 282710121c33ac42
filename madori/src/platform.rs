use std::process::{ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use madori_ipc::{StateEvent, ThemeColors, WindowId};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};

use crate::ipc::EventBroadcaster;
use crate::theme::{render_all, AssetTemplate};

/// How the window manager is asked to restart after a theme change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RestartMethod {
    /// Only broadcast `RestartRequested`; the host listens on the event socket
    #[default]
    Event,
    /// Run a shell command, e.g. `qtile cmd-obj -o cmd -f restart`
    Command { command: String },
    /// Send a signal to a process
    Signal { pid: i32, signal: String },
}

/// Trait for acting on the window manager that embeds us.
/// This abstraction allows mocking in tests.
pub trait HostControl {
    fn set_floating(&self, window_id: WindowId, floating: bool);
    fn restart(&self) -> Result<(), String>;
    fn regenerate_assets(&self, colors: &ThemeColors);
    fn broadcast(&self, event: StateEvent);
}

/// Host reached through the event socket, a shell command or a signal.
pub struct SystemHost {
    broadcaster: EventBroadcaster,
    restart_method: RestartMethod,
    assets: Vec<AssetTemplate>,
}

impl SystemHost {
    pub fn new(
        broadcaster: EventBroadcaster,
        restart_method: RestartMethod,
        assets: Vec<AssetTemplate>,
    ) -> Self {
        Self {
            broadcaster,
            restart_method,
            assets,
        }
    }
}

impl HostControl for SystemHost {
    fn set_floating(&self, window_id: WindowId, floating: bool) {
        tracing::debug!("Window {} floating={}", window_id, floating);
        self.broadcaster
            .send(StateEvent::WindowFloatingChanged { window_id, floating });
    }

    fn restart(&self) -> Result<(), String> {
        self.broadcaster.send(StateEvent::RestartRequested);

        match &self.restart_method {
            RestartMethod::Event => {
                tracing::info!("Restart requested");
                Ok(())
            }
            RestartMethod::Command { command } => {
                tracing::info!("Restarting host: {}", command);
                spawn_restart_command(command)
                    .map(|_| ())
                    .map_err(|e| format!("Failed to run restart command: {}", e))
            }
            RestartMethod::Signal { pid, signal } => {
                let sig: Signal = signal
                    .parse()
                    .map_err(|e| format!("Invalid signal {}: {}", signal, e))?;
                tracing::info!("Sending {} to pid {}", sig.as_str(), pid);
                kill(Pid::from_raw(*pid), sig)
                    .map_err(|e| format!("Failed to signal pid {}: {}", pid, e))
            }
        }
    }

    fn regenerate_assets(&self, colors: &ThemeColors) {
        if self.assets.is_empty() {
            return;
        }
        let errors = render_all(&self.assets, colors);
        for e in &errors {
            tracing::warn!("Asset not regenerated: {}", e);
        }
        tracing::info!(
            "Regenerated {}/{} assets",
            self.assets.len() - errors.len(),
            self.assets.len()
        );
    }

    fn broadcast(&self, event: StateEvent) {
        self.broadcaster.send(event);
    }
}

/// Run `command` through `sh -c` and reap it on a detached thread.
/// Returns the child's pid and a handle yielding its exit status.
fn spawn_restart_command(
    command: &str,
) -> std::io::Result<(u32, JoinHandle<Option<ExitStatus>>)> {
    let mut child = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .spawn()?;
    let pid = child.id();
    let command = command.to_string();
    let handle = thread::Builder::new()
        .name("restart-wait".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => {
                if !status.success() {
                    tracing::warn!("Restart command `{}` exited with {}", command, status);
                }
                Some(status)
            }
            Err(e) => {
                tracing::error!("Failed to wait for restart command `{}`: {}", command, e);
                None
            }
        })?;
    Ok((pid, handle))
}
