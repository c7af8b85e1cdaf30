use once_cell::sync::Lazy;
use tracing::debug;

use crate::rules::{FieldRule, RuleKind, RuleSet, label_rules};

/// Labeled fields the vision model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    SignalType,
    Confidence,
    Analysis,
    EntryPoint,
    TargetPrice,
    StopLoss,
    RiskAssessment,
    Timeframe,
    Reasoning,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::SignalType,
        Field::Confidence,
        Field::Analysis,
        Field::EntryPoint,
        Field::TargetPrice,
        Field::StopLoss,
        Field::RiskAssessment,
        Field::Timeframe,
        Field::Reasoning,
    ];

    /// Section labels in lookup order, English first.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Field::SignalType => &["SIGNAL TYPE", "JELTÍPUS"],
            Field::Confidence => &["CONFIDENCE", "MEGBÍZHATÓSÁG"],
            Field::Analysis => &["ANALYSIS"],
            Field::EntryPoint => &["ENTRY POINT", "BELÉPÉSI PONT"],
            Field::TargetPrice => &["TARGET PRICE", "CÉL ÁR"],
            Field::StopLoss => &["STOP LOSS"],
            Field::RiskAssessment => &["RISK ASSESSMENT", "KOCKÁZAT"],
            Field::Timeframe => &["TIMEFRAME", "IDŐKERET"],
            Field::Reasoning => &["REASONING", "INDOKLÁS"],
        }
    }

    /// Shorthand markers from the three-line answer format, tried after all labels.
    pub fn anchors(&self) -> &'static [&'static str] {
        match self {
            Field::SignalType => &["👉"],
            Field::Timeframe => &["⏱"],
            Field::Reasoning => &["➝"],
            _ => &[],
        }
    }

    pub fn name(&self) -> &'static str {
        self.labels()[0]
    }

    pub fn rules(&self) -> &'static RuleSet {
        match self {
            Field::SignalType => &SIGNAL_TYPE,
            Field::Confidence => &CONFIDENCE,
            Field::Analysis => &ANALYSIS,
            Field::EntryPoint => &ENTRY_POINT,
            Field::TargetPrice => &TARGET_PRICE,
            Field::StopLoss => &STOP_LOSS,
            Field::RiskAssessment => &RISK_ASSESSMENT,
            Field::Timeframe => &TIMEFRAME,
            Field::Reasoning => &REASONING,
        }
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        match self.rules().first_match(text) {
            Some((kind, value)) => {
                debug!(field = self.name(), ?kind, %value, "field extracted");
                Some(value)
            }
            None => {
                debug!(field = self.name(), "no match");
                None
            }
        }
    }

    fn build_rules(&self) -> RuleSet {
        let mut rules: Vec<FieldRule> = self.labels().iter().flat_map(|l| label_rules(l)).collect();
        rules.extend(self.anchors().iter().map(|a| FieldRule::anchor(a)));
        RuleSet::new(rules)
    }
}

static SIGNAL_TYPE: Lazy<RuleSet> = Lazy::new(|| Field::SignalType.build_rules());
static CONFIDENCE: Lazy<RuleSet> = Lazy::new(|| Field::Confidence.build_rules());
static ANALYSIS: Lazy<RuleSet> = Lazy::new(|| Field::Analysis.build_rules());
static ENTRY_POINT: Lazy<RuleSet> = Lazy::new(|| Field::EntryPoint.build_rules());
static TARGET_PRICE: Lazy<RuleSet> = Lazy::new(|| Field::TargetPrice.build_rules());
static STOP_LOSS: Lazy<RuleSet> = Lazy::new(|| Field::StopLoss.build_rules());
static RISK_ASSESSMENT: Lazy<RuleSet> = Lazy::new(|| Field::RiskAssessment.build_rules());
static TIMEFRAME: Lazy<RuleSet> = Lazy::new(|| Field::Timeframe.build_rules());
static REASONING: Lazy<RuleSet> = Lazy::new(|| Field::Reasoning.build_rules());

/// Extracts the value labeled `field_name` using the header, bold and bare rules.
///
/// Never fails: no match yields an empty string.
pub fn extract_field(text: &str, field_name: &str) -> String {
    if let Some(field) = Field::ALL.iter().find(|f| f.name().eq_ignore_ascii_case(field_name)) {
        return field.extract(text).unwrap_or_default();
    }

    RuleSet::for_label(field_name)
        .first_match(text)
        .map(|(_, value)| value)
        .unwrap_or_default()
}

/// Rules that identify a dedicated signal-type section, as opposed to a label that
/// merely appears somewhere in the text.
pub(crate) fn signal_section_rules() -> &'static RuleSet {
    static RULES: Lazy<RuleSet> = Lazy::new(|| {
        let rules = Field::SignalType
            .rules()
            .rules()
            .iter()
            .filter(|r| matches!(r.kind(), RuleKind::SectionHeader | RuleKind::Anchor))
            .cloned()
            .collect();
        RuleSet::new(rules)
    });
    &RULES
}
