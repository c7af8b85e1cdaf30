//! Turns free-form vision-model answers into [`ParsedAnalysis`] records.
//!
//! Every extraction degrades to a default instead of failing: the model output is
//! non-deterministic and mixes English and Hungarian labels, and the caller always needs
//! something to render.

pub mod confidence;
pub mod content;
pub mod details;
pub mod fields;
pub mod rules;
pub mod signal;

use common::models::{ParsedAnalysis, RemoteAnalysis, RemoteDetails};
use tracing::debug;

pub use confidence::extract_confidence;
pub use content::extract_main_content;
pub use details::extract_detail_bullets;
pub use fields::{Field, extract_field};
pub use rules::{FieldRule, RuleKind, RuleSet};
pub use signal::classify_signal;

/// Parses raw model text.
pub fn parse_content(text: &str) -> ParsedAnalysis {
    let text = text.replace("\r\n", "\n");
    let classification = classify_signal(&text);

    let parsed = ParsedAnalysis {
        signal: classification.signal,
        signal_basis: classification.basis,
        content: extract_main_content(&text),
        confidence: extract_confidence(&text),
        details: extract_detail_bullets(&text),
        entry_point: Field::EntryPoint.extract(&text),
        target_price: Field::TargetPrice.extract(&text),
        stop_loss: Field::StopLoss.extract(&text),
        risk_level: Field::RiskAssessment.extract(&text),
        timeframe: Field::Timeframe.extract(&text),
        reasoning: Field::Reasoning.extract(&text),
    };

    debug!(
        signal = %parsed.signal,
        basis = ?parsed.signal_basis,
        confidence = parsed.confidence,
        details = parsed.details.len(),
        "parsed analysis"
    );
    parsed
}

/// Parses a server response.
///
/// Values the server already extracted win over the ones parsed here from `content`,
/// as long as they are non-empty.
pub fn parse_response(remote: &RemoteAnalysis) -> ParsedAnalysis {
    let mut parsed = parse_content(&remote.content);

    if let Some(confidence) = remote.confidence.filter(|c| c.is_finite() && *c >= 0.0) {
        parsed.confidence = confidence.round() as u32;
    }

    if let Some(details) = &remote.details {
        apply_details(&mut parsed, details);
    }
    parsed
}

fn apply_details(parsed: &mut ParsedAnalysis, details: &RemoteDetails) {
    prefer(&mut parsed.entry_point, &details.entry_point);
    prefer(&mut parsed.target_price, &details.target_price);
    prefer(&mut parsed.stop_loss, &details.stop_loss);
    prefer(&mut parsed.risk_level, &details.risk_level);
    prefer(&mut parsed.timeframe, &details.timeframe);
    prefer(&mut parsed.reasoning, &details.reasoning);
}

fn prefer(local: &mut Option<String>, remote: &Option<String>) {
    if let Some(value) = remote.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        *local = Some(value.to_string());
    }
}
