use std::collections::HashSet;

use madori_ipc::{FloatReason, FloatRule, RuleValidation, RulesInfo, WindowAttributes};

/// Windows advertising a maximum width below this are treated as fixed-size dialogs.
pub const MAX_WIDTH_FLOAT_THRESHOLD: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Float(FloatReason),
    Tile,
}

impl Verdict {
    pub fn is_floating(self) -> bool {
        matches!(self, Verdict::Float(_))
    }

    pub fn reason(self) -> Option<FloatReason> {
        match self {
            Verdict::Float(reason) => Some(reason),
            Verdict::Tile => None,
        }
    }
}

/// Float-or-tile decision engine.
/// Holds the force-float application list and the ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct FloatingRules {
    force_float: Vec<String>,
    rules: Vec<FloatRule>,
}

impl FloatingRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(force_float: Vec<String>, rules: Vec<FloatRule>) -> Self {
        let mut engine = Self::new();
        for app in force_float {
            engine.add_force_float(&app);
        }
        engine.rules = rules;
        engine
    }

    pub fn rules(&self) -> &[FloatRule] {
        &self.rules
    }

    pub fn force_floating_apps(&self) -> &[String] {
        &self.force_float
    }

    pub fn info(&self) -> RulesInfo {
        RulesInfo {
            force_floating_apps: self.force_float.clone(),
            floating_rules: self.rules.clone(),
        }
    }

    pub fn add_rule(&mut self, rule: FloatRule) {
        tracing::info!("Adding floating rule: {}", rule);
        self.rules.push(rule);
    }

    pub fn remove_rule(&mut self, rule: &FloatRule) -> bool {
        let initial_len = self.rules.len();
        self.rules.retain(|r| r != rule);
        let removed = self.rules.len() < initial_len;
        if removed {
            tracing::info!("Removed floating rule: {}", rule);
        }
        removed
    }

    /// Returns false if the app was already listed.
    pub fn add_force_float(&mut self, app: &str) -> bool {
        let app = app.trim().to_lowercase();
        if app.is_empty() || self.force_float.contains(&app) {
            return false;
        }
        tracing::info!("Adding force-float app: {}", app);
        self.force_float.push(app);
        true
    }

    pub fn remove_force_float(&mut self, app: &str) -> bool {
        let app = app.trim().to_lowercase();
        let initial_len = self.force_float.len();
        self.force_float.retain(|a| a != &app);
        let removed = self.force_float.len() < initial_len;
        if removed {
            tracing::info!("Removed force-float app: {}", app);
        }
        removed
    }

    pub fn is_force_float(&self, attrs: &WindowAttributes) -> bool {
        attrs
            .wm_class
            .as_deref()
            .map(str::to_lowercase)
            .is_some_and(|class| self.force_float.contains(&class))
    }

    pub fn matching_rule(&self, attrs: &WindowAttributes) -> Option<usize> {
        self.rules.iter().position(|rule| rule.matches(attrs))
    }

    /// Decide whether a window floats. First match wins:
    /// force-float list, rule list, transient hint, small max_width hint.
    pub fn evaluate(&self, attrs: &WindowAttributes) -> Verdict {
        if self.is_force_float(attrs) {
            return Verdict::Float(FloatReason::ForceFloat);
        }
        if let Some(index) = self.matching_rule(attrs) {
            return Verdict::Float(FloatReason::Rule { index });
        }
        if attrs.transient_parent().is_some() {
            return Verdict::Float(FloatReason::Transient);
        }
        if let Some(max_width) = attrs.max_width() {
            if max_width > 0 && max_width < MAX_WIDTH_FLOAT_THRESHOLD {
                return Verdict::Float(FloatReason::SizeHint { max_width });
            }
        }
        Verdict::Tile
    }

    pub fn validate(&self) -> RuleValidation {
        let mut report = RuleValidation {
            valid: true,
            rule_count: self.rules.len(),
            force_float_count: self.force_float.len(),
            ..Default::default()
        };

        let mut seen = HashSet::new();
        for (i, rule) in self.rules.iter().enumerate() {
            let pattern = rule.pattern();
            if pattern.is_empty() {
                report
                    .warnings
                    .push(format!("Rule {} has an empty {} pattern", i, rule.kind()));
            } else if pattern.trim().is_empty() {
                report.errors.push(format!(
                    "Rule {} has a whitespace-only {} pattern",
                    i,
                    rule.kind()
                ));
                report.valid = false;
            }
            let key = (rule.kind(), pattern.to_lowercase());
            if !seen.insert(key) {
                report
                    .warnings
                    .push(format!("Rule {} duplicates an earlier rule: {}", i, rule));
            }
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if let FloatRule::WmClass(name) = rule {
                if self.force_float.contains(&name.to_lowercase()) {
                    report.warnings.push(format!(
                        "Rule {} is shadowed by force-float app '{}'",
                        i,
                        name.to_lowercase()
                    ));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> FloatingRules {
        FloatingRules::with_rules(
            vec!["Pavucontrol".to_string(), "arandr".to_string()],
            vec![
                FloatRule::wm_class("confirm"),
                FloatRule::title("pinentry"),
                FloatRule::wm_class("gnome-calculator"),
            ],
        )
    }

    /// Build a window for one combination of the four decision inputs.
    fn window(force: bool, rule: bool, transient: bool, small: bool) -> WindowAttributes {
        let mut attrs = if force {
            WindowAttributes::new("pavucontrol", "Pavucontrol")
        } else {
            WindowAttributes::new("st-256color", "st-256color")
        };
        if rule {
            attrs = attrs.with_title("Pinentry prompt");
        }
        if transient {
            attrs = attrs.with_transient_for(0x400001);
        }
        if small {
            attrs = attrs.with_max_width(480);
        }
        attrs
    }

    #[test]
    fn test_precedence_over_all_combinations() {
        let engine = engine();
        for bits in 0u8..16 {
            let force = bits & 1 != 0;
            let rule = bits & 2 != 0;
            let transient = bits & 4 != 0;
            let small = bits & 8 != 0;

            let expected = if force {
                Verdict::Float(FloatReason::ForceFloat)
            } else if rule {
                Verdict::Float(FloatReason::Rule { index: 1 })
            } else if transient {
                Verdict::Float(FloatReason::Transient)
            } else if small {
                Verdict::Float(FloatReason::SizeHint { max_width: 480 })
            } else {
                Verdict::Tile
            };

            let attrs = window(force, rule, transient, small);
            assert_eq!(
                engine.evaluate(&attrs),
                expected,
                "force={} rule={} transient={} small={}",
                force,
                rule,
                transient,
                small
            );
        }
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let engine = engine();
        let attrs = window(false, true, true, false);
        let first = engine.evaluate(&attrs);
        for _ in 0..10 {
            assert_eq!(engine.evaluate(&attrs), first);
        }
    }

    #[test]
    fn test_force_float_uses_class_name_case_insensitively() {
        let engine = engine();
        assert_eq!(
            engine.evaluate(&WindowAttributes::new("x", "ARANDR")),
            Verdict::Float(FloatReason::ForceFloat)
        );
        // Instance name alone does not trigger the force-float list
        assert_eq!(
            engine.evaluate(&WindowAttributes::new("arandr", "Display")),
            Verdict::Tile
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let engine = FloatingRules::with_rules(
            vec![],
            vec![FloatRule::title("dialog"), FloatRule::wm_class("confirm")],
        );
        let attrs = WindowAttributes::new("confirm", "Confirm").with_title("Confirm dialog");
        assert_eq!(
            engine.evaluate(&attrs),
            Verdict::Float(FloatReason::Rule { index: 0 })
        );
    }

    #[test]
    fn test_missing_attributes_tile() {
        let engine = engine();
        assert_eq!(engine.evaluate(&WindowAttributes::default()), Verdict::Tile);
    }

    #[test]
    fn test_title_rule_without_class() {
        let engine = engine();
        let attrs = WindowAttributes::default().with_title("pinentry-gnome3");
        assert_eq!(
            engine.evaluate(&attrs),
            Verdict::Float(FloatReason::Rule { index: 1 })
        );
    }

    #[test]
    fn test_size_hint_threshold_boundary() {
        let engine = FloatingRules::new();
        let attrs = WindowAttributes::new("a", "A").with_max_width(999);
        assert_eq!(
            engine.evaluate(&attrs),
            Verdict::Float(FloatReason::SizeHint { max_width: 999 })
        );
        let attrs = WindowAttributes::new("a", "A").with_max_width(1000);
        assert_eq!(engine.evaluate(&attrs), Verdict::Tile);
        // A zero hint means "unset"
        let attrs = WindowAttributes::new("a", "A").with_max_width(0);
        assert_eq!(engine.evaluate(&attrs), Verdict::Tile);
    }

    #[test]
    fn test_transient_for_zero_is_not_transient() {
        let engine = FloatingRules::new();
        let attrs = WindowAttributes::new("a", "A").with_transient_for(0);
        assert_eq!(engine.evaluate(&attrs), Verdict::Tile);
    }

    #[test]
    fn test_add_and_remove_rules() {
        let mut engine = FloatingRules::new();
        let rule = FloatRule::wm_class("krunner");
        engine.add_rule(rule.clone());
        assert_eq!(engine.rules().len(), 1);
        assert!(engine.evaluate(&WindowAttributes::new("krunner", "krunner")).is_floating());

        assert!(engine.remove_rule(&rule));
        assert!(!engine.remove_rule(&rule));
        assert!(!engine.evaluate(&WindowAttributes::new("krunner", "krunner")).is_floating());
    }

    #[test]
    fn test_force_float_list_is_deduplicated() {
        let mut engine = FloatingRules::new();
        assert!(engine.add_force_float("Steam"));
        assert!(!engine.add_force_float("steam"));
        assert!(!engine.add_force_float("  "));
        assert_eq!(engine.force_floating_apps(), &["steam".to_string()]);

        assert!(engine.remove_force_float("STEAM"));
        assert!(engine.force_floating_apps().is_empty());
    }

    #[test]
    fn test_validate_reports_problems() {
        let engine = FloatingRules::with_rules(
            vec!["pavucontrol".to_string()],
            vec![
                FloatRule::wm_class("confirm"),
                FloatRule::wm_class("Confirm"),
                FloatRule::title(""),
                FloatRule::title("   "),
                FloatRule::wm_class("Pavucontrol"),
            ],
        );
        let report = engine.validate();
        assert!(!report.valid);
        assert_eq!(report.rule_count, 5);
        assert_eq!(report.force_float_count, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.warnings.iter().any(|w| w.contains("duplicates")));
        assert!(report.warnings.iter().any(|w| w.contains("empty")));
        assert!(report.warnings.iter().any(|w| w.contains("shadowed")));
    }

    #[test]
    fn test_validate_default_like_rules_is_clean() {
        let report = engine().validate();
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }
}
