use serde::{Deserialize, Serialize};

use crate::{
    FloatReason, FloatRule, ProblematicWindow, ReloadResult, RuleValidation, RulesInfo,
    ThemeColors, ThemeStatus, WindowAttributes, WindowId, WindowInfo, WindowStats,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Window operations (sent by the host)
    ManageWindow {
        window_id: WindowId,
        attributes: WindowAttributes,
    },
    UnmanageWindow {
        window_id: WindowId,
    },
    SetFloating {
        window_id: WindowId,
        floating: bool,
    },
    Classify {
        attributes: WindowAttributes,
    },
    ReapplyRules,

    // Window queries
    ListWindows,
    ListFloating,
    WindowStats,
    ProblematicWindows,

    // Rule operations
    AddRule { rule: FloatRule },
    RemoveRule { rule: FloatRule },
    AddForceFloat { app: String },
    RemoveForceFloat { app: String },
    ListRules,
    ValidateRules,

    // Theme operations
    GetColors,
    ThemeStatus,
    ReloadTheme,
    StartWatching,
    StopWatching,

    // Control
    Quit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error {
        message: String,
    },
    Verdict {
        floating: bool,
        reason: Option<FloatReason>,
    },
    Windows {
        windows: Vec<WindowInfo>,
    },
    Stats {
        stats: WindowStats,
    },
    Problems {
        windows: Vec<ProblematicWindow>,
    },
    Reapplied {
        changed: usize,
    },
    Rules {
        rules: RulesInfo,
    },
    Validation {
        report: RuleValidation,
    },
    Colors {
        colors: Box<ThemeColors>,
    },
    Theme {
        status: ThemeStatus,
    },
    Reload {
        result: ReloadResult,
    },
}
