use tokio::sync::mpsc;

use crate::event::Event;
use crate::ipc::{EventBroadcaster, IpcCommandWithResponse, SnapshotRequest};

pub struct IpcRelay {
    pub cmd_tx: mpsc::Sender<IpcCommandWithResponse>,
    pub cmd_rx: mpsc::Receiver<IpcCommandWithResponse>,
}

pub struct SnapshotRelay {
    pub request_tx: mpsc::Sender<SnapshotRequest>,
    pub request_rx: mpsc::Receiver<SnapshotRequest>,
}

pub struct WatcherEvents {
    pub event_tx: mpsc::UnboundedSender<Event>,
    pub event_rx: mpsc::UnboundedReceiver<Event>,
}

pub struct Channels {
    pub ipc: IpcRelay,
    pub snapshots: SnapshotRelay,
    pub watcher: WatcherEvents,
    pub broadcaster: EventBroadcaster,
}

pub fn create_channels() -> Channels {
    // IPC server -> dispatcher
    let (cmd_tx, cmd_rx) = mpsc::channel::<IpcCommandWithResponse>(256);

    // Event server -> dispatcher
    let (request_tx, request_rx) = mpsc::channel::<SnapshotRequest>(16);

    // Watcher threads -> dispatcher; unbounded so std threads never block
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    Channels {
        ipc: IpcRelay { cmd_tx, cmd_rx },
        snapshots: SnapshotRelay {
            request_tx,
            request_rx,
        },
        watcher: WatcherEvents { event_tx, event_rx },
        broadcaster: EventBroadcaster::new(256),
    }
}
