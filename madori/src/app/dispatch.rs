use madori_ipc::{Command, Response, StateEvent};

use crate::core::State;
use crate::event::Event;
use crate::platform::HostControl;
use crate::theme::ReloadOutcome;

use super::command::process_command;
use super::effects::execute_effects;
use super::theme::{process_theme_command, ThemeRuntime};

/// Unified command dispatcher: process command -> execute effects -> respond.
pub fn dispatch_command<H: HostControl>(
    cmd: &Command,
    state: &mut State,
    theme: &mut ThemeRuntime,
    host: &H,
) -> Response {
    let result = match cmd {
        Command::GetColors
        | Command::ThemeStatus
        | Command::ReloadTheme
        | Command::StartWatching
        | Command::StopWatching => process_theme_command(theme, cmd),
        _ => process_command(state, cmd),
    };

    if let Err(e) = execute_effects(result.effects, host) {
        return Response::Error { message: e };
    }

    result.response
}

/// `dispatch_command` for the async dispatcher loop. A manual reload waits
/// for an in-flight reload and stopping the watcher joins its thread, so the
/// worker is handed off to the runtime first.
pub fn dispatch_command_in_place<H: HostControl>(
    cmd: &Command,
    state: &mut State,
    theme: &mut ThemeRuntime,
    host: &H,
) -> Response {
    tokio::task::block_in_place(|| dispatch_command(cmd, state, theme, host))
}

/// `handle_event` for the async dispatcher loop; asset rendering and restart
/// commands touch the filesystem.
pub fn handle_event_in_place<H: HostControl>(event: Event, host: &H) {
    tokio::task::block_in_place(|| handle_event(event, host))
}

/// Handle a notification from the watcher threads.
pub fn handle_event<H: HostControl>(event: Event, host: &H) {
    match event {
        Event::ThemeReloaded(outcome) => {
            match &outcome {
                ReloadOutcome::Applied { colors, .. } => tracing::info!(
                    "Theme file changed, applying background={}",
                    colors.special.background
                ),
                _ => tracing::debug!("Theme reload finished: {:?}", outcome.to_result()),
            }
            if let Err(e) = execute_effects(outcome.into_effects(), host) {
                tracing::error!("Failed to apply theme change: {}", e);
            }
        }
        Event::WatchStateChanged(state) => {
            host.broadcast(StateEvent::WatchStateChanged { state });
        }
    }
}

pub fn snapshot(state: &State, theme: &ThemeRuntime) -> StateEvent {
    StateEvent::Snapshot {
        windows: state.window_infos(),
        colors: Box::new((*theme.colors()).clone()),
        watch_state: theme.watcher.state(),
    }
}
