use async_trait::async_trait;
use common::config::AppConfig;
use common::models::{AnalysisEnvelope, AuthSession, ImagePayload, RemoteAnalysis};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{api_error, http_client, trim_base_url};
use crate::error::{BackendError, Result};
use crate::traits::AnalysisBackend;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeRequest<'a> {
    image_data: &'a str,
}

/// Invokes the hosted analysis function of the backend platform.
#[derive(Clone)]
pub struct FunctionClient {
    client: Client,
    base_url: String,
    anon_key: String,
    function: String,
}

impl FunctionClient {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        function: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: trim_base_url(base_url),
            anon_key: anon_key.into(),
            function: function.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.backend_url,
            &config.backend_anon_key,
            &config.analysis_function,
            config.request_timeout,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/functions/v1/{}", self.base_url, self.function)
    }
}

#[async_trait]
impl AnalysisBackend for FunctionClient {
    async fn analyze(&self, image: &ImagePayload, auth: &AuthSession) -> Result<RemoteAnalysis> {
        image.validate()?;

        info!(
            "Invoking {} for user {} ({}, ~{} bytes)",
            self.function,
            auth.user_id,
            image.format(),
            image.estimated_size()
        );

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&auth.access_token)
            .header("apikey", &self.anon_key)
            .json(&InvokeRequest {
                image_data: image.data_url(),
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp, "Analysis function").await);
        }

        let AnalysisEnvelope { analysis, error } = resp.json::<AnalysisEnvelope>().await?;
        match (analysis, error) {
            (Some(analysis), _) => {
                debug!("Analysis received: {} chars", analysis.content.len());
                Ok(analysis)
            }
            (None, Some(message)) => Err(BackendError::api(200, message)),
            (None, None) => Err(BackendError::MissingPayload),
        }
    }
}
