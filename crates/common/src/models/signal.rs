use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional label extracted from model text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    #[default]
    Buy,
    Sell,
}

impl SignalType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "BUY Signal",
            Self::Sell => "SELL Signal",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a [`SignalType`] was decided.
///
/// Anything other than `Section` is a best-effort guess and should be presented as such.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SignalBasis {
    /// A dedicated signal-type section named the direction.
    Section,
    /// Directional keywords were counted over the whole text and one side won.
    KeywordFrequency { buy: usize, sell: usize },
    /// Nothing decisive was found (no keywords, or a tie); the buy side was assumed.
    #[default]
    Default,
}

impl SignalBasis {
    pub fn is_heuristic(&self) -> bool {
        !matches!(self, Self::Section)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalClassification {
    pub signal: SignalType,
    pub basis: SignalBasis,
}
