//! Rule-based field extraction from recognized text.
//!
//! Each field is described by a [`FieldRules`] set: an ordered list of pure
//! `text → Option<value>` heuristics. Rules run in priority order and the
//! first non-empty value wins; if none match the field is the "Not found"
//! sentinel.

use idscan_core::{FieldKind, FieldValue};
use tracing::debug;

mod date;
mod document;
mod gender;
mod ids;
mod name;
pub mod normalize;

pub use date::{sanitize_dob, DOB};
pub use document::{extract_aadhaar, extract_unknown, extract_voter};
pub use gender::{normalize_gender, GENDER};
pub use ids::{
    find_aadhaar_number, find_card_number, AADHAAR_NUMBER, CARD_NUMBER, UNKNOWN_ID_NUMBER,
};
pub use name::{detect_name_line, AADHAAR_NAME, FATHER_NAME, UNKNOWN_NAME, VOTER_NAME};

/// A single extraction heuristic.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<String>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Ordered rules for one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: FieldKind,
    rules: &'static [Rule],
}

/// Outcome of evaluating a [`FieldRules`] set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub value: FieldValue,
    /// Name of the rule that produced the value, if any did.
    pub rule: Option<&'static str>,
}

impl FieldRules {
    pub const fn new(field: FieldKind, rules: &'static [Rule]) -> Self {
        Self { field, rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn evaluate(&self, text: &str) -> Evaluation {
        for rule in self.rules {
            let Some(raw) = (rule.apply)(text) else { continue };
            let value = FieldValue::found(raw);
            if value.is_found() {
                debug!(field = self.field.key(), rule = rule.name, "field extracted");
                return Evaluation { value, rule: Some(rule.name) };
            }
        }
        debug!(field = self.field.key(), "no rule matched");
        Evaluation { value: FieldValue::not_found(), rule: None }
    }

    /// Shorthand for `evaluate(text).value`.
    pub fn extract(&self, text: &str) -> FieldValue {
        self.evaluate(text).value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_a(_: &str) -> Option<String> {
        Some("a".into())
    }
    fn always_b(_: &str) -> Option<String> {
        Some("b".into())
    }
    fn blank(_: &str) -> Option<String> {
        Some("   ".into())
    }
    fn never(_: &str) -> Option<String> {
        None
    }

    const ORDERED: FieldRules = FieldRules::new(
        FieldKind::Name,
        &[
            Rule { name: "never", apply: never },
            Rule { name: "blank", apply: blank },
            Rule { name: "a", apply: always_a },
            Rule { name: "b", apply: always_b },
        ],
    );

    #[test]
    fn first_non_empty_rule_wins() {
        let eval = ORDERED.evaluate("anything");
        assert_eq!(eval.value.as_str(), "a");
        assert_eq!(eval.rule, Some("a"));
    }

    #[test]
    fn no_match_yields_sentinel() {
        const NONE: FieldRules = FieldRules::new(FieldKind::Dob, &[Rule { name: "never", apply: never }]);
        let eval = NONE.evaluate("text");
        assert!(!eval.value.is_found());
        assert_eq!(eval.value.as_str(), "Not found");
        assert_eq!(eval.rule, None);
    }

    #[test]
    fn rule_names_keep_priority_order() {
        assert_eq!(ORDERED.rule_names(), vec!["never", "blank", "a", "b"]);
        assert_eq!(VOTER_NAME.rule_names(), vec!["labeled_name", "name_after_label_line"]);
    }
}
