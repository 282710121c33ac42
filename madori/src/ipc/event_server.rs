use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixStream;
use tokio::sync::{broadcast, mpsc, oneshot};

use madori_ipc::{StateEvent, SubscribeRequest};

use super::bind_socket;

pub type SnapshotRequest = oneshot::Sender<StateEvent>;

pub struct EventServer {
    socket_path: PathBuf,
    event_rx: broadcast::Receiver<StateEvent>,
    snapshot_tx: mpsc::Sender<SnapshotRequest>,
}

impl EventServer {
    pub fn new(
        socket_path: PathBuf,
        event_rx: broadcast::Receiver<StateEvent>,
        snapshot_tx: mpsc::Sender<SnapshotRequest>,
    ) -> Self {
        Self {
            socket_path,
            event_rx,
            snapshot_tx,
        }
    }

    pub async fn run(self) -> Result<()> {
        let listener = bind_socket(&self.socket_path)?;
        tracing::info!("Event server listening on {}", self.socket_path.display());

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let event_rx = self.event_rx.resubscribe();
                    let snapshot_tx = self.snapshot_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, event_rx, snapshot_tx).await
                        {
                            tracing::debug!("Event subscriber disconnected: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Event server accept error: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        stream: UnixStream,
        mut event_rx: broadcast::Receiver<StateEvent>,
        snapshot_tx: mpsc::Sender<SnapshotRequest>,
    ) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(());
        }

        let request = match serde_json::from_str::<SubscribeRequest>(line.trim()) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Malformed subscribe request, sending everything: {}", e);
                SubscribeRequest::default()
            }
        };
        let filter = request.effective_filter();
        tracing::debug!(
            "Subscriber attached (windows={}, theme={}, snapshot={})",
            filter.windows,
            filter.theme,
            request.snapshot
        );

        if request.snapshot {
            let (resp_tx, resp_rx) = oneshot::channel();
            if snapshot_tx.send(resp_tx).await.is_ok() {
                if let Ok(snapshot) = resp_rx.await {
                    write_event(&mut writer, &snapshot).await?;
                }
            }
        }

        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    if filter.matches(&event) {
                        write_event(&mut writer, &event).await?;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event subscriber lagged by {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn write_event(writer: &mut OwnedWriteHalf, event: &StateEvent) -> Result<()> {
    let json = serde_json::to_string(event)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

impl Drop for EventServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Sender side of the state event stream; cheap to clone into any thread.
#[derive(Clone)]
pub struct EventBroadcaster {
    event_tx: broadcast::Sender<StateEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self { event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.event_tx.subscribe()
    }

    pub fn send(&self, event: StateEvent) {
        // No subscribers is not an error
        let _ = self.event_tx.send(event);
    }
}
