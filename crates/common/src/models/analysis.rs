use serde::{Deserialize, Serialize};

use super::signal::{SignalBasis, SignalType};

pub const DEFAULT_CONFIDENCE: u32 = 75;
pub const MAX_DETAILS: usize = 8;

/// Structured projection of one model response.
///
/// Every field has a usable default, so a record can always be built even from
/// empty or garbled input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAnalysis {
    pub signal: SignalType,
    pub signal_basis: SignalBasis,
    pub content: String,
    pub confidence: u32,
    pub details: Vec<String>,
    pub entry_point: Option<String>,
    pub target_price: Option<String>,
    pub stop_loss: Option<String>,
    pub risk_level: Option<String>,
    pub timeframe: Option<String>,
    pub reasoning: Option<String>,
}

impl Default for ParsedAnalysis {
    fn default() -> Self {
        Self {
            signal: SignalType::default(),
            signal_basis: SignalBasis::default(),
            content: String::new(),
            confidence: DEFAULT_CONFIDENCE,
            details: Vec::new(),
            entry_point: None,
            target_price: None,
            stop_loss: None,
            risk_level: None,
            timeframe: None,
            reasoning: None,
        }
    }
}

impl ParsedAnalysis {
    pub fn has_levels(&self) -> bool {
        self.entry_point.is_some() || self.target_price.is_some() || self.stop_loss.is_some()
    }
}
