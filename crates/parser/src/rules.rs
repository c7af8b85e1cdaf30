//! Ordered extraction rules.
//!
//! A [`RuleSet`] is a priority-ordered list of [`FieldRule`]s; the first rule whose
//! pattern captures a non-empty value wins. Each rule kind can be built and tested on
//! its own.

use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// `### NAME` followed by text up to the next `#` or end of line.
    SectionHeader,
    /// `**NAME**` or `**NAME:**` followed by the rest of the line.
    BoldLabel,
    /// A line of the form `NAME: value`.
    BareLabel,
    /// An emoji marker such as `👉` followed by the rest of the line.
    Anchor,
}

#[derive(Clone)]
pub struct FieldRule {
    kind: RuleKind,
    label: String,
    pattern: Regex,
}

impl FieldRule {
    pub fn section(label: &str) -> Self {
        Self::build(
            RuleKind::SectionHeader,
            label,
            format!(r"(?i)###[ \t]*{}[:\s]*([^#\n]+)", label_pattern(label)),
        )
    }

    pub fn bold(label: &str) -> Self {
        Self::build(
            RuleKind::BoldLabel,
            label,
            format!(
                r"(?i)\*\*[ \t]*{}[ \t]*:?[ \t]*\*\*[ \t]*:?[ \t]*([^\n]+)",
                label_pattern(label)
            ),
        )
    }

    pub fn bare(label: &str) -> Self {
        Self::build(
            RuleKind::BareLabel,
            label,
            format!(r"(?im)^[ \t]*{}[ \t]*:[ \t]*(\S[^\n]*)", label_pattern(label)),
        )
    }

    pub fn anchor(marker: &str) -> Self {
        Self::build(
            RuleKind::Anchor,
            marker,
            format!(r"{}\x{{FE0F}}?[ \t]*([^\n]+)", regex::escape(marker)),
        )
    }

    fn build(kind: RuleKind, label: &str, pattern: String) -> Self {
        // Labels are escaped before interpolation, so the pattern is always valid.
        let pattern = Regex::new(&pattern).expect("field rule pattern");
        Self {
            kind,
            label: label.to_string(),
            pattern,
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the cleaned captured value, or `None` when the rule does not match or
    /// the value is empty once emphasis markers are removed.
    pub fn apply(&self, text: &str) -> Option<String> {
        let captured = self.pattern.captures(text)?.get(1)?.as_str();
        let value = clean_value(captured);
        (!value.is_empty()).then_some(value)
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// Header, bold and bare rules for one label, in that order.
    pub fn for_label(label: &str) -> Self {
        Self::new(label_rules(label))
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn first_match(&self, text: &str) -> Option<(RuleKind, String)> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(text).map(|value| (rule.kind(), value)))
    }
}

pub(crate) fn label_rules(label: &str) -> Vec<FieldRule> {
    vec![
        FieldRule::section(label),
        FieldRule::bold(label),
        FieldRule::bare(label),
    ]
}

/// Escapes each word of the label and lets the words be separated by any run of
/// horizontal whitespace (including none).
fn label_pattern(label: &str) -> String {
    label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[ \t]*")
}

/// Strips surrounding whitespace and emphasis markers.
pub fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '*' || c == '_')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_rule_reads_next_line() {
        let rule = FieldRule::section("ENTRY POINT");
        assert_eq!(
            rule.apply("### ENTRY POINT\n174.90\n\n### TARGET PRICE\n175.30"),
            Some("174.90".to_string())
        );
    }

    #[test]
    fn test_section_rule_same_line_with_colon() {
        let rule = FieldRule::section("SIGNAL TYPE");
        assert_eq!(rule.apply("### Signal Type: **SELL**"), Some("SELL".to_string()));
    }

    #[test]
    fn test_section_rule_stops_at_next_header() {
        let rule = FieldRule::section("STOP LOSS");
        assert_eq!(rule.apply("### STOP LOSS\n### RISK ASSESSMENT\nHIGH"), None);
    }

    #[test]
    fn test_section_rule_tolerates_missing_space_between_words() {
        let rule = FieldRule::section("ENTRY POINT");
        assert_eq!(rule.apply("###ENTRYPOINT 12.5"), Some("12.5".to_string()));
    }

    #[test]
    fn test_bold_rule_with_inner_colon() {
        let rule = FieldRule::bold("Stop Loss");
        assert_eq!(
            rule.apply("- **Stop loss:** 174.40 (támasz alatt)"),
            Some("174.40 (támasz alatt)".to_string())
        );
    }

    #[test]
    fn test_bold_rule_with_outer_colon() {
        let rule = FieldRule::bold("TIMEFRAME");
        assert_eq!(rule.apply("**TIMEFRAME**: 3 perc"), Some("3 perc".to_string()));
    }

    #[test]
    fn test_bare_rule_requires_line_start_and_colon() {
        let rule = FieldRule::bare("STOP LOSS");
        assert_eq!(rule.apply("Stop Loss: 95"), Some("95".to_string()));
        assert_eq!(rule.apply("  stop loss : 95.5 "), Some("95.5".to_string()));
        assert_eq!(rule.apply("keep a tight stop loss: 95"), None);
        assert_eq!(rule.apply("STOP LOSS 95"), None);
    }

    #[test]
    fn test_anchor_rule() {
        let rule = FieldRule::anchor("⏱");
        assert_eq!(rule.apply("➝ EMA bounce\n⏱ 3 perc"), Some("3 perc".to_string()));
    }

    #[test]
    fn test_anchor_rule_skips_variation_selector() {
        let rule = FieldRule::anchor("⏱");
        assert_eq!(rule.apply("⏱\u{FE0F} 5 perc"), Some("5 perc".to_string()));
    }

    #[test]
    fn test_hungarian_label_matches_case_insensitively() {
        let rule = FieldRule::section("BELÉPÉSI PONT");
        assert_eq!(rule.apply("### Belépési pont\n1.0850"), Some("1.0850".to_string()));
    }

    #[test]
    fn test_empty_after_cleaning_is_no_match() {
        let rule = FieldRule::bare("REASONING");
        assert_eq!(rule.apply("REASONING: **"), None);
    }

    #[test]
    fn test_label_metacharacters_are_escaped() {
        let rule = FieldRule::bare("R/R (1:2)");
        assert_eq!(rule.apply("R/R (1:2): good"), Some("good".to_string()));
    }

    #[test]
    fn test_rule_set_precedence_header_first() {
        let set = RuleSet::for_label("ENTRY POINT");
        let text = "ENTRY POINT: 99\n**ENTRY POINT** 98\n### ENTRY POINT\n100";
        assert_eq!(set.first_match(text), Some((RuleKind::SectionHeader, "100".to_string())));
    }

    #[test]
    fn test_rule_set_precedence_bold_before_bare() {
        let set = RuleSet::for_label("ENTRY POINT");
        let text = "ENTRY POINT: 99\n**ENTRY POINT** 98";
        assert_eq!(set.first_match(text), Some((RuleKind::BoldLabel, "98".to_string())));
    }

    #[test]
    fn test_clean_value_strips_emphasis() {
        assert_eq!(clean_value("  **BUY**  "), "BUY");
        assert_eq!(clean_value("__MEDIUM__"), "MEDIUM");
        assert_eq!(clean_value("*"), "");
    }
}
