use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type WindowId = u32;

/// WM_NORMAL_HINTS subset the floating rules look at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
}

/// Attributes a host reports for a window. Every field is optional; hosts
/// send whatever they could read from the window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowAttributes {
    /// First WM_CLASS string (instance name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wm_instance: Option<String>,
    /// Second WM_CLASS string (class name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wm_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transient_for: Option<WindowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_hints: Option<SizeHints>,
}

impl WindowAttributes {
    pub fn new(wm_instance: impl Into<String>, wm_class: impl Into<String>) -> Self {
        Self {
            wm_instance: Some(wm_instance.into()),
            wm_class: Some(wm_class.into()),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_transient_for(mut self, parent: WindowId) -> Self {
        self.transient_for = Some(parent);
        self
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        let hints = self.size_hints.get_or_insert_with(SizeHints::default);
        hints.max_width = Some(max_width);
        self
    }

    /// Parent window id, treating 0 as "no parent" like X11 does.
    pub fn transient_parent(&self) -> Option<WindowId> {
        self.transient_for.filter(|&id| id != 0)
    }

    pub fn max_width(&self) -> Option<u32> {
        self.size_hints.and_then(|h| h.max_width)
    }

    /// Human readable name: class name, then instance name, then "Unknown".
    pub fn display_name(&self) -> &str {
        self.wm_class
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.wm_instance.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub name: String,
    pub wm_class: Option<String>,
    pub title: Option<String>,
    pub is_floating: bool,
    pub transient_for: Option<WindowId>,
    pub parent: Option<WindowId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStats {
    pub total_windows: usize,
    pub floating_windows: usize,
    pub tiled_windows: usize,
    pub transient_windows: usize,
    pub windows_by_class: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblematicWindow {
    pub id: WindowId,
    pub name: String,
    pub is_floating: bool,
    pub issues: Vec<String>,
}
