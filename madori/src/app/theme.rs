use std::sync::Arc;

use madori_ipc::{Command, Response, ThemeColors, ThemeStatus};

use crate::effect::CommandResult;
use crate::theme::{ColorCache, Reloader, ThemeWatcher};

/// The colour cache together with the reloader and watcher that feed it.
pub struct ThemeRuntime {
    pub cache: Arc<ColorCache>,
    pub reloader: Arc<Reloader>,
    pub watcher: ThemeWatcher,
}

impl ThemeRuntime {
    pub fn colors(&self) -> Arc<ThemeColors> {
        self.cache.current()
    }

    pub fn status(&self) -> ThemeStatus {
        let colors = self.cache.current();
        ThemeStatus {
            path: self.reloader.path().display().to_string(),
            state: self.watcher.state(),
            mode: self.watcher.mode().to_string(),
            source: self.cache.source(),
            background: colors.special.background.to_string(),
            foreground: colors.special.foreground.to_string(),
            last_reload: self.cache.updated_at().map(|t| t.to_rfc3339()),
        }
    }
}

pub fn process_theme_command(theme: &mut ThemeRuntime, cmd: &Command) -> CommandResult {
    match cmd {
        Command::GetColors => CommandResult::with_response(Response::Colors {
            colors: Box::new((*theme.colors()).clone()),
        }),
        Command::ThemeStatus => CommandResult::with_response(Response::Theme {
            status: theme.status(),
        }),
        Command::ReloadTheme => {
            tracing::info!("Manual theme reload requested");
            let outcome = theme.reloader.reload();
            let result = outcome.to_result();
            CommandResult::with_response_and_effects(
                Response::Reload { result },
                outcome.into_effects(),
            )
        }
        Command::StartWatching => match theme.watcher.start() {
            Ok(()) => CommandResult::ok(),
            Err(e) => CommandResult::error(format!("Failed to start watching: {:#}", e)),
        },
        Command::StopWatching => {
            theme.watcher.stop();
            CommandResult::ok()
        }
        _ => CommandResult::error(format!("Not a theme command: {:?}", cmd)),
    }
}
