use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeOutcome {
    Win,
    Loss,
}

impl TradeOutcome {
    pub fn is_win(&self) -> bool {
        matches!(self, Self::Win)
    }
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win => f.write_str("win"),
            Self::Loss => f.write_str("loss"),
        }
    }
}

impl FromStr for TradeOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "win" | "w" => Ok(Self::Win),
            "loss" | "lose" | "l" => Ok(Self::Loss),
            other => Err(format!("unknown trade outcome '{other}', expected win or loss")),
        }
    }
}

/// Aggregate win/loss counts kept by the statistics collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradingStats {
    pub total_trades: u32,
    pub wins: u32,
    pub losses: u32,
    /// Percentage, 0-100.
    pub win_rate: f64,
}

impl TradingStats {
    pub fn record(&mut self, outcome: TradeOutcome) {
        self.total_trades += 1;
        match outcome {
            TradeOutcome::Win => self.wins += 1,
            TradeOutcome::Loss => self.losses += 1,
        }
        self.win_rate = f64::from(self.wins) / f64::from(self.total_trades) * 100.0;
    }
}
