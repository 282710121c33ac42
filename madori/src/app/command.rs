use crate::core::State;
use crate::effect::CommandResult;
use madori_ipc::{Command, Response};

fn reapply_response(state: &mut State) -> CommandResult {
    let (changed, effects) = state.reapply_all();
    CommandResult::with_response_and_effects(Response::Reapplied { changed }, effects)
}

/// Pure function: processes a window or rule command and returns a response with effects.
/// Theme commands touch threads and files and are handled by `process_theme_command`.
pub fn process_command(state: &mut State, cmd: &Command) -> CommandResult {
    match cmd {
        Command::ManageWindow {
            window_id,
            attributes,
        } => {
            let (verdict, effects) = state.manage_window(*window_id, attributes.clone());
            CommandResult::with_response_and_effects(
                Response::Verdict {
                    floating: verdict.is_floating(),
                    reason: verdict.reason(),
                },
                effects,
            )
        }
        Command::UnmanageWindow { window_id } => match state.unmanage_window(*window_id) {
            Some(effects) => CommandResult::ok_with_effects(effects),
            None => CommandResult::error(format!("Window {} is not managed", window_id)),
        },
        Command::SetFloating {
            window_id,
            floating,
        } => {
            if state.set_floating(*window_id, *floating) {
                CommandResult::ok()
            } else {
                CommandResult::error(format!("Window {} is not managed", window_id))
            }
        }
        Command::Classify { attributes } => {
            let verdict = state.classify(attributes);
            CommandResult::with_response(Response::Verdict {
                floating: verdict.is_floating(),
                reason: verdict.reason(),
            })
        }
        Command::ReapplyRules => reapply_response(state),

        // Queries
        Command::ListWindows => CommandResult::with_response(Response::Windows {
            windows: state.window_infos(),
        }),
        Command::ListFloating => CommandResult::with_response(Response::Windows {
            windows: state.floating_windows(),
        }),
        Command::WindowStats => CommandResult::with_response(Response::Stats {
            stats: state.statistics(),
        }),
        Command::ProblematicWindows => CommandResult::with_response(Response::Problems {
            windows: state.problematic_windows(),
        }),

        // Rule changes re-apply to every managed window
        Command::AddRule { rule } => {
            if rule.pattern().trim().is_empty() {
                return CommandResult::error("Rule pattern must not be empty");
            }
            state.rules.add_rule(rule.clone());
            reapply_response(state)
        }
        Command::RemoveRule { rule } => {
            if !state.rules.remove_rule(rule) {
                return CommandResult::error(format!("No such rule: {}", rule));
            }
            reapply_response(state)
        }
        Command::AddForceFloat { app } => {
            if app.trim().is_empty() {
                return CommandResult::error("App name must not be empty");
            }
            if !state.rules.add_force_float(app) {
                return CommandResult::error(format!("'{}' already floats", app.trim()));
            }
            reapply_response(state)
        }
        Command::RemoveForceFloat { app } => {
            if !state.rules.remove_force_float(app) {
                return CommandResult::error(format!("'{}' is not in the force-float list", app));
            }
            reapply_response(state)
        }
        Command::ListRules => CommandResult::with_response(Response::Rules {
            rules: state.rules.info(),
        }),
        Command::ValidateRules => CommandResult::with_response(Response::Validation {
            report: state.rules.validate(),
        }),

        Command::Quit => {
            tracing::info!("Quit command received");
            CommandResult::ok()
        }

        Command::GetColors
        | Command::ThemeStatus
        | Command::ReloadTheme
        | Command::StartWatching
        | Command::StopWatching => {
            tracing::warn!("Theme command reached window handler: {:?}", cmd);
            CommandResult::error("Theme commands are handled by the theme runtime")
        }
    }
}
