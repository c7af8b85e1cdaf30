use async_trait::async_trait;
use common::config::AppConfig;
use common::models::{AuthSession, TradeOutcome, TradingStats};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{api_error, http_client, trim_base_url};
use crate::error::Result;
use crate::traits::StatsStore;

const UPDATE_RPC: &str = "update_trading_stats";
const STATS_TABLE: &str = "user_trading_stats";

#[derive(Debug, Serialize)]
struct UpdateStatsParams<'a> {
    p_user_id: &'a str,
    p_is_win: bool,
}

#[derive(Debug, Deserialize)]
struct StatsRow {
    #[serde(default)]
    total_trades: u32,
    #[serde(default)]
    wins: u32,
    #[serde(default)]
    losses: u32,
    win_rate: Option<f64>,
}

impl From<StatsRow> for TradingStats {
    fn from(row: StatsRow) -> Self {
        Self {
            total_trades: row.total_trades,
            wins: row.wins,
            losses: row.losses,
            win_rate: row.win_rate.unwrap_or(0.0),
        }
    }
}

/// Per-user trading statistics through the platform's REST layer.
#[derive(Clone)]
pub struct StatsClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl StatsClient {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: trim_base_url(base_url),
            anon_key: anon_key.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.backend_url,
            &config.backend_anon_key,
            config.request_timeout,
        )
    }
}

#[async_trait]
impl StatsStore for StatsClient {
    async fn record_outcome(&self, auth: &AuthSession, outcome: TradeOutcome) -> Result<TradingStats> {
        info!("Recording {} for user {}", outcome, auth.user_id);

        let url = format!("{}/rest/v1/rpc/{}", self.base_url, UPDATE_RPC);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&auth.access_token)
            .header("apikey", &self.anon_key)
            .json(&UpdateStatsParams {
                p_user_id: &auth.user_id,
                p_is_win: outcome.is_win(),
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp, "Stats update").await);
        }

        self.load_stats(auth).await
    }

    async fn load_stats(&self, auth: &AuthSession) -> Result<TradingStats> {
        let url = format!("{}/rest/v1/{}", self.base_url, STATS_TABLE);
        let user_filter = format!("eq.{}", auth.user_id);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&auth.access_token)
            .header("apikey", &self.anon_key)
            .query(&[
                ("select", "total_trades,wins,losses,win_rate"),
                ("user_id", user_filter.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp, "Stats load").await);
        }

        let rows = resp.json::<Vec<StatsRow>>().await?;
        let stats = rows.into_iter().next().map(TradingStats::from).unwrap_or_default();
        debug!("Stats for {}: {:?}", auth.user_id, stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> StatsClient {
        StatsClient::new(server.uri(), "anon-key", Duration::from_secs(5)).unwrap()
    }

    fn auth() -> AuthSession {
        AuthSession::new("user-7", "jwt")
    }

    #[tokio::test]
    async fn test_record_outcome_calls_rpc_then_reloads() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/update_trading_stats"))
            .and(header("apikey", "anon-key"))
            .and(body_json(json!({ "p_user_id": "user-7", "p_is_win": false })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/user_trading_stats"))
            .and(query_param("user_id", "eq.user-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "total_trades": 4, "wins": 3, "losses": 1, "win_rate": 75.0 }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let stats = client(&server)
            .record_outcome(&auth(), TradeOutcome::Loss)
            .await
            .unwrap();

        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.losses, 1);
        assert!((stats.win_rate - 75.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_missing_row_is_zero_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_trading_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let stats = client(&server).load_stats(&auth()).await.unwrap();
        assert_eq!(stats, TradingStats::default());
    }

    #[tokio::test]
    async fn test_null_win_rate_defaults_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "total_trades": 0, "wins": 0, "losses": 0, "win_rate": null }
            ])))
            .mount(&server)
            .await;

        let stats = client(&server).load_stats(&auth()).await.unwrap();
        assert_eq!(stats.win_rate, 0.0);
    }

    #[tokio::test]
    async fn test_rpc_failure_skips_reload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({ "message": "permission denied" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .record_outcome(&auth(), TradeOutcome::Win)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 403, ref message } if message == "permission denied"));
    }
}
