mod channels;
mod command;
mod dispatch;
mod effects;
mod theme;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal::unix::{signal, SignalKind};

use crate::core::{Config, State};
use crate::ipc::{self, EventServer, IpcServer};
use crate::platform::{HostControl, SystemHost};
use crate::theme::{BackupManager, ColorCache, Reloader, ThemeWatcher};
use madori_ipc::Command;

use channels::{create_channels, Channels, IpcRelay, SnapshotRelay, WatcherEvents};
use dispatch::{dispatch_command_in_place, handle_event_in_place, snapshot};
use theme::ThemeRuntime;

const QUIT_FLUSH_DELAY: Duration = Duration::from_millis(50);

pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(self) -> Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run_async())
    }

    async fn run_async(self) -> Result<()> {
        let Channels {
            ipc,
            snapshots,
            watcher,
            broadcaster,
        } = create_channels();
        let IpcRelay { cmd_tx, mut cmd_rx } = ipc;
        let SnapshotRelay {
            request_tx: snapshot_tx,
            request_rx: mut snapshot_rx,
        } = snapshots;
        let WatcherEvents {
            event_tx,
            mut event_rx,
        } = watcher;

        let config = self.config;
        let mut state = State::new(config.floating_rules());
        let validation = state.rules.validate();
        for warning in &validation.warnings {
            tracing::warn!("Floating rules: {}", warning);
        }
        for error in &validation.errors {
            tracing::error!("Floating rules: {}", error);
        }

        let backups = BackupManager::new(
            config.backup_dir.clone(),
            config.last_good_file.clone(),
            config.max_backups,
        );
        let initial = backups.load_initial(&config.theme_file);
        tracing::info!(
            "Initial colors: background={} foreground={}",
            initial.colors.special.background,
            initial.colors.special.foreground
        );
        let cache = Arc::new(ColorCache::new(
            initial.colors,
            initial.source,
            initial.hash,
        ));
        let reloader = Arc::new(Reloader::new(
            config.theme_file.clone(),
            cache.clone(),
            backups,
            config.restart_grace(),
        ));
        let mut theme = ThemeRuntime {
            cache,
            reloader: reloader.clone(),
            watcher: ThemeWatcher::new(config.watcher_options(), reloader, event_tx),
        };

        let host = SystemHost::new(
            broadcaster.clone(),
            config.restart.clone(),
            config.assets.clone(),
        );
        host.regenerate_assets(&theme.colors());

        if let Err(e) = theme.watcher.start() {
            tracing::error!("Failed to start theme watcher: {:#}", e);
        }

        let ipc_server = IpcServer::new(ipc::socket_path(), cmd_tx);
        tokio::spawn(async move {
            if let Err(e) = ipc_server.run().await {
                tracing::error!("IPC server error: {}", e);
            }
        });

        let event_server = EventServer::new(
            ipc::event_socket_path(),
            broadcaster.subscribe(),
            snapshot_tx,
        );
        tokio::spawn(async move {
            if let Err(e) = event_server.run().await {
                tracing::error!("Event server error: {}", e);
            }
        });

        let mut sigterm = signal(SignalKind::terminate())?;

        tracing::info!("Dispatcher loop started");
        loop {
            tokio::select! {
                Some((cmd, resp_tx)) = cmd_rx.recv() => {
                    tracing::debug!("Received IPC command: {:?}", cmd);
                    let response = dispatch_command_in_place(&cmd, &mut state, &mut theme, &host);
                    let _ = resp_tx.send(response).await;
                    if matches!(cmd, Command::Quit) {
                        // Give the server task a moment to write the reply
                        tokio::time::sleep(QUIT_FLUSH_DELAY).await;
                        break;
                    }
                }
                Some(event) = event_rx.recv() => {
                    handle_event_in_place(event, &host);
                }
                Some(reply) = snapshot_rx.recv() => {
                    let _ = reply.send(snapshot(&state, &theme));
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                    break;
                }
                _ = sigterm.recv() => {
                    tracing::info!("Terminated");
                    break;
                }
                else => break,
            }
        }

        tokio::task::block_in_place(|| theme.watcher.stop());
        tracing::info!("madori exiting");
        Ok(())
    }
}
