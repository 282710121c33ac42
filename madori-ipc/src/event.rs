use serde::{Deserialize, Serialize};

use crate::{ThemeColors, WatchState, WindowId, WindowInfo};

/// Event filter for subscribing to specific event types
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Subscribe to window events (managed, unmanaged, floating changes)
    #[serde(default)]
    pub windows: bool,
    /// Subscribe to theme events (colours changed, restart requests, watcher state)
    #[serde(default)]
    pub theme: bool,
}

impl EventFilter {
    pub fn all() -> Self {
        Self {
            windows: true,
            theme: true,
        }
    }

    pub fn matches(&self, event: &StateEvent) -> bool {
        match event {
            StateEvent::WindowManaged { .. }
            | StateEvent::WindowUnmanaged { .. }
            | StateEvent::WindowFloatingChanged { .. } => self.windows,
            StateEvent::ThemeChanged { .. }
            | StateEvent::RestartRequested
            | StateEvent::WatchStateChanged { .. } => self.theme,
            StateEvent::Snapshot { .. } => true,
        }
    }

    pub fn any(&self) -> bool {
        self.windows || self.theme
    }
}

/// Request to subscribe to state events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Whether to send a snapshot on connection
    #[serde(default)]
    pub snapshot: bool,
    /// Event filter (if not set or all false, subscribes to all events)
    #[serde(default)]
    pub filter: EventFilter,
}

impl SubscribeRequest {
    pub fn effective_filter(&self) -> EventFilter {
        if self.filter.any() {
            self.filter.clone()
        } else {
            EventFilter::all()
        }
    }
}

/// State change events sent to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    WindowManaged {
        window: WindowInfo,
    },
    WindowUnmanaged {
        window_id: WindowId,
    },
    /// The host should set the window's floating flag to this value
    WindowFloatingChanged {
        window_id: WindowId,
        floating: bool,
    },
    ThemeChanged {
        colors: Box<ThemeColors>,
    },
    /// The host should live-restart to pick up regenerated assets
    RestartRequested,
    WatchStateChanged {
        state: WatchState,
    },
    Snapshot {
        windows: Vec<WindowInfo>,
        colors: Box<ThemeColors>,
        watch_state: WatchState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_subscribes_to_everything() {
        let request = SubscribeRequest::default();
        let filter = request.effective_filter();
        assert!(filter.windows);
        assert!(filter.theme);
    }

    #[test]
    fn test_filter_matches_by_category() {
        let filter = EventFilter {
            windows: false,
            theme: true,
        };
        assert!(filter.matches(&StateEvent::RestartRequested));
        assert!(filter.matches(&StateEvent::WatchStateChanged {
            state: WatchState::Watching
        }));
        assert!(!filter.matches(&StateEvent::WindowUnmanaged { window_id: 1 }));
        assert!(!filter.matches(&StateEvent::WindowFloatingChanged {
            window_id: 1,
            floating: true
        }));
    }

    #[test]
    fn test_snapshot_always_passes() {
        let filter = EventFilter {
            windows: true,
            theme: false,
        };
        let snapshot = StateEvent::Snapshot {
            windows: vec![],
            colors: Box::new(ThemeColors::fallback()),
            watch_state: WatchState::Idle,
        };
        assert!(filter.matches(&snapshot));
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&StateEvent::WindowFloatingChanged {
            window_id: 7,
            floating: true,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"window_floating_changed","window_id":7,"floating":true}"#
        );
        assert_eq!(
            serde_json::to_string(&StateEvent::RestartRequested).unwrap(),
            r#"{"type":"restart_requested"}"#
        );
    }

    #[test]
    fn test_subscribe_request_parses_partial_json() {
        let request: SubscribeRequest =
            serde_json::from_str(r#"{"filter":{"theme":true}}"#).unwrap();
        assert!(!request.snapshot);
        assert!(request.filter.theme);
        assert!(!request.filter.windows);
    }
}
