use crate::effect::Effect;
use crate::platform::HostControl;

/// Execute side effects. Every effect runs even if an earlier one failed;
/// the failures are reported together.
pub fn execute_effects<H: HostControl>(effects: Vec<Effect>, host: &H) -> Result<(), String> {
    let mut errors = Vec::new();

    for effect in effects {
        match effect {
            Effect::SetFloating {
                window_id,
                floating,
            } => {
                host.set_floating(window_id, floating);
            }
            Effect::RegenerateAssets { colors } => {
                host.regenerate_assets(&colors);
            }
            Effect::RestartHost => {
                if let Err(e) = host.restart() {
                    tracing::error!("Host restart failed: {}", e);
                    errors.push(e);
                }
            }
            Effect::Broadcast(event) => {
                host.broadcast(event);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}
