use std::sync::Arc;

use madori_ipc::{Response, StateEvent, ThemeColors, WindowId};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Tell the host to set a window's floating flag
    SetFloating { window_id: WindowId, floating: bool },
    RegenerateAssets { colors: Arc<ThemeColors> },
    RestartHost,
    Broadcast(StateEvent),
}

pub struct CommandResult {
    pub response: Response,
    pub effects: Vec<Effect>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            response: Response::Ok,
            effects: vec![],
        }
    }

    pub fn ok_with_effects(effects: Vec<Effect>) -> Self {
        Self {
            response: Response::Ok,
            effects,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            response: Response::Error {
                message: message.into(),
            },
            effects: vec![],
        }
    }

    pub fn with_response(response: Response) -> Self {
        Self {
            response,
            effects: vec![],
        }
    }

    pub fn with_response_and_effects(response: Response, effects: Vec<Effect>) -> Self {
        Self { response, effects }
    }
}
