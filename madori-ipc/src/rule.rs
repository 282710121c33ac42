use serde::{Deserialize, Serialize};

use crate::WindowAttributes;

/// A floating rule. Serialized as `{"wm_class": "..."}` or `{"title": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatRule {
    /// Case-insensitive equality against the instance or the class name
    WmClass(String),
    /// Case-insensitive substring of the window title
    Title(String),
}

impl FloatRule {
    pub fn wm_class(name: impl Into<String>) -> Self {
        Self::WmClass(name.into())
    }

    pub fn title(fragment: impl Into<String>) -> Self {
        Self::Title(fragment.into())
    }

    pub fn pattern(&self) -> &str {
        match self {
            Self::WmClass(p) | Self::Title(p) => p,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::WmClass(_) => "wm_class",
            Self::Title(_) => "title",
        }
    }

    pub fn matches(&self, attrs: &WindowAttributes) -> bool {
        if self.pattern().is_empty() {
            return false;
        }
        match self {
            Self::WmClass(name) => {
                let name = name.to_lowercase();
                [attrs.wm_instance.as_deref(), attrs.wm_class.as_deref()]
                    .into_iter()
                    .flatten()
                    .any(|c| c.to_lowercase() == name)
            }
            Self::Title(fragment) => attrs
                .title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&fragment.to_lowercase())),
        }
    }
}

impl std::fmt::Display for FloatRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}='{}'", self.kind(), self.pattern())
    }
}

/// Why a window was floated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FloatReason {
    ForceFloat,
    Rule { index: usize },
    Transient,
    SizeHint { max_width: u32 },
}

impl std::fmt::Display for FloatReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForceFloat => write!(f, "force-float app"),
            Self::Rule { index } => write!(f, "floating rule #{}", index),
            Self::Transient => write!(f, "transient window"),
            Self::SizeHint { max_width } => write!(f, "max_width hint {}", max_width),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesInfo {
    pub force_floating_apps: Vec<String>,
    pub floating_rules: Vec<FloatRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleValidation {
    pub valid: bool,
    pub rule_count: usize,
    pub force_float_count: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_serialization_shape() {
        let rules = vec![FloatRule::wm_class("confirm"), FloatRule::title("pinentry")];
        let json = serde_json::to_string(&rules).unwrap();
        assert_eq!(json, r#"[{"wm_class":"confirm"},{"title":"pinentry"}]"#);

        let parsed: Vec<FloatRule> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rules);
    }

    #[test]
    fn test_wm_class_rule_matches_instance_or_class() {
        let rule = FloatRule::wm_class("pavucontrol");
        assert!(rule.matches(&WindowAttributes::new("pavucontrol", "Pavucontrol")));
        assert!(rule.matches(&WindowAttributes::new("something", "PAVUCONTROL")));
        assert!(!rule.matches(&WindowAttributes::new("pavu", "control")));
        assert!(!rule.matches(&WindowAttributes::default()));
    }

    #[test]
    fn test_title_rule_is_case_insensitive_substring() {
        let rule = FloatRule::title("BranchDialog");
        let attrs = WindowAttributes::new("gitk", "Gitk").with_title("gitk: branchdialog (repo)");
        assert!(rule.matches(&attrs));
        assert!(!rule.matches(&WindowAttributes::new("gitk", "Gitk")));

        let plasma = FloatRule::title("Desktop — Plasma");
        let attrs = WindowAttributes::default().with_title("DESKTOP — PLASMA");
        assert!(plasma.matches(&attrs));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let attrs = WindowAttributes {
            wm_instance: Some(String::new()),
            wm_class: Some(String::new()),
            title: Some("anything".to_string()),
            ..Default::default()
        };
        assert!(!FloatRule::wm_class("").matches(&attrs));
        assert!(!FloatRule::title("").matches(&attrs));
    }

    #[test]
    fn test_reason_serialization() {
        let json = serde_json::to_string(&FloatReason::Rule { index: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"rule","index":3}"#);
        let json = serde_json::to_string(&FloatReason::Transient).unwrap();
        assert_eq!(json, r#"{"type":"transient"}"#);
    }
}
