use std::collections::HashMap;

use madori_ipc::{
    ProblematicWindow, StateEvent, WindowAttributes, WindowId, WindowInfo, WindowStats,
};

use super::{FloatingRules, Verdict, Window};
use crate::effect::Effect;

/// Windows reported by the host, plus the rules used to place them.
pub struct State {
    pub windows: HashMap<WindowId, Window>,
    pub rules: FloatingRules,
}

impl State {
    pub fn new(rules: FloatingRules) -> Self {
        Self {
            windows: HashMap::new(),
            rules,
        }
    }

    pub fn classify(&self, attrs: &WindowAttributes) -> Verdict {
        self.rules.evaluate(attrs)
    }

    /// Register a window (or refresh one the host re-reports after a restart)
    /// and apply the floating verdict to it.
    pub fn manage_window(
        &mut self,
        window_id: WindowId,
        attributes: WindowAttributes,
    ) -> (Verdict, Vec<Effect>) {
        let verdict = self.rules.evaluate(&attributes);

        let parent = attributes
            .transient_parent()
            .filter(|p| *p != window_id && self.windows.contains_key(p));

        let window = self
            .windows
            .entry(window_id)
            .or_insert_with(|| Window::new(window_id, WindowAttributes::default()));
        window.attributes = attributes;
        window.is_floating = verdict.is_floating();
        window.parent = parent;

        match verdict.reason() {
            Some(reason) => tracing::debug!(
                "Window {} ({}) floats: {}",
                window_id,
                window.name(),
                reason
            ),
            None => tracing::debug!("Window {} ({}) tiles", window_id, window.name()),
        }
        if let Some(parent) = parent {
            tracing::debug!("Window {} is transient for {}", window_id, parent);
        }

        let info = window.to_info();

        // Adopt transients that arrived before this window
        for child in self.windows.values_mut() {
            if child.id != window_id
                && child.parent.is_none()
                && child.attributes.transient_parent() == Some(window_id)
            {
                child.parent = Some(window_id);
                tracing::debug!("Window {} adopted transient {}", window_id, child.id);
            }
        }

        let effects = vec![
            Effect::SetFloating {
                window_id,
                floating: verdict.is_floating(),
            },
            Effect::Broadcast(StateEvent::WindowManaged { window: info }),
        ];
        (verdict, effects)
    }

    pub fn unmanage_window(&mut self, window_id: WindowId) -> Option<Vec<Effect>> {
        let window = self.windows.remove(&window_id)?;
        tracing::debug!("Window {} ({}) unmanaged", window_id, window.name());

        for child in self.windows.values_mut() {
            if child.parent == Some(window_id) {
                child.parent = None;
            }
        }

        Some(vec![Effect::Broadcast(StateEvent::WindowUnmanaged {
            window_id,
        })])
    }

    /// Record a floating toggle made on the host side.
    pub fn set_floating(&mut self, window_id: WindowId, floating: bool) -> bool {
        let Some(window) = self.windows.get_mut(&window_id) else {
            return false;
        };
        window.is_floating = floating;
        true
    }

    /// Re-evaluate one window and write the verdict onto its floating flag.
    /// Returns the verdict and a `SetFloating` effect if the flag changed.
    pub fn apply_verdict(&mut self, window_id: WindowId) -> Option<(Verdict, Option<Effect>)> {
        let verdict = {
            let window = self.windows.get(&window_id)?;
            self.rules.evaluate(&window.attributes)
        };
        let window = self.windows.get_mut(&window_id)?;
        let floating = verdict.is_floating();
        if window.is_floating == floating {
            return Some((verdict, None));
        }

        window.is_floating = floating;
        tracing::info!(
            "Applied verdict: window {} ({}) set to floating={}",
            window_id,
            window.name(),
            floating
        );
        Some((
            verdict,
            Some(Effect::SetFloating {
                window_id,
                floating,
            }),
        ))
    }

    /// Re-apply verdicts to every managed window, e.g. after a host restart
    /// or a rule change. Returns how many flags changed.
    pub fn reapply_all(&mut self) -> (usize, Vec<Effect>) {
        let mut window_ids: Vec<WindowId> = self.windows.keys().copied().collect();
        window_ids.sort_unstable();

        let effects: Vec<Effect> = window_ids
            .into_iter()
            .filter_map(|id| self.apply_verdict(id))
            .filter_map(|(_, effect)| effect)
            .collect();

        let changed = effects.len();
        tracing::info!("Re-applied floating rules, {} windows changed", changed);
        (changed, effects)
    }

    pub fn window_infos(&self) -> Vec<WindowInfo> {
        let mut infos: Vec<WindowInfo> = self.windows.values().map(Window::to_info).collect();
        infos.sort_by_key(|w| w.id);
        infos
    }

    pub fn floating_windows(&self) -> Vec<WindowInfo> {
        self.window_infos()
            .into_iter()
            .filter(|w| w.is_floating)
            .collect()
    }

    pub fn statistics(&self) -> WindowStats {
        let mut stats = WindowStats::default();
        for window in self.windows.values() {
            stats.total_windows += 1;
            if window.is_floating {
                stats.floating_windows += 1;
            } else {
                stats.tiled_windows += 1;
            }
            if window.is_transient() {
                stats.transient_windows += 1;
            }
            if let Some(class) = window.attributes.wm_instance.as_deref() {
                *stats.windows_by_class.entry(class.to_string()).or_default() += 1;
            }
        }
        stats
    }

    /// Windows whose floating flag disagrees with the rules, or transients
    /// whose parent was never reported.
    pub fn problematic_windows(&self) -> Vec<ProblematicWindow> {
        let mut problems: Vec<ProblematicWindow> = self
            .windows
            .values()
            .filter_map(|window| {
                let mut issues = Vec::new();
                let should_float = self.rules.evaluate(&window.attributes).is_floating();
                if should_float && !window.is_floating {
                    issues.push("Should be floating but is tiled".to_string());
                } else if !should_float && window.is_floating {
                    issues.push("Should be tiled but is floating".to_string());
                }
                if window.is_transient() && window.parent.is_none() {
                    issues.push("Transient window without parent".to_string());
                }
                if issues.is_empty() {
                    return None;
                }
                Some(ProblematicWindow {
                    id: window.id,
                    name: window.name().to_string(),
                    is_floating: window.is_floating,
                    issues,
                })
            })
            .collect();
        problems.sort_by_key(|p| p.id);
        problems
    }
}
