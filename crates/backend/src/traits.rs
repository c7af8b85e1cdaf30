use async_trait::async_trait;
use common::models::{AuthSession, ImagePayload, RemoteAnalysis, TradeOutcome, TradingStats};

use crate::error::Result;

/// Something that can turn a chart screenshot into a model analysis.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, image: &ImagePayload, auth: &AuthSession) -> Result<RemoteAnalysis>;
}

/// Per-user win/loss statistics kept outside this process.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Records one outcome and returns the updated aggregate.
    async fn record_outcome(&self, auth: &AuthSession, outcome: TradeOutcome) -> Result<TradingStats>;

    async fn load_stats(&self, auth: &AuthSession) -> Result<TradingStats>;
}
