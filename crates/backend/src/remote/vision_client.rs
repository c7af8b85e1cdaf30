use async_trait::async_trait;
use common::config::AppConfig;
use common::models::{AuthSession, ImagePayload, RemoteAnalysis, RemoteDetails};
use parser::extract_field;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::prompt::ANALYSIS_PROMPT;
use super::{http_client, trim_base_url};
use crate::error::{BackendError, Result};
use crate::traits::AnalysisBackend;

/// Confidence reported when the model text carries no confidence section at all.
const FALLBACK_CONFIDENCE: f64 = 50.0;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Calls an OpenAI-compatible vision model directly, doing the work the hosted
/// analysis function does server side.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl VisionClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: trim_base_url(base_url),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_deref()
            .ok_or_else(|| BackendError::Configuration("OpenAI API key not configured".into()))?;

        Self::new(
            &config.openai_base_url,
            api_key,
            &config.vision_model,
            config.vision_max_tokens,
            config.request_timeout,
        )
    }
}

#[async_trait]
impl AnalysisBackend for VisionClient {
    async fn analyze(&self, image: &ImagePayload, auth: &AuthSession) -> Result<RemoteAnalysis> {
        image.validate()?;

        info!("Requesting vision analysis with {} for user {}", self.model, auth.user_id);

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: ANALYSIS_PROMPT,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ],
            }],
            max_completion_tokens: self.max_tokens,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            error!("Vision API error {status}: {detail}");
            let message = if status == StatusCode::TOO_MANY_REQUESTS {
                "Rate limit exceeded"
            } else {
                "Failed to analyze screenshot"
            };
            return Err(BackendError::api(status.as_u16(), message));
        }

        let text = resp
            .json::<ChatResponse>()
            .await?
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(BackendError::MissingPayload)?;

        debug!("Vision raw response: {text}");
        Ok(build_remote_analysis(text))
    }
}

/// Builds the wire-shaped analysis from raw model text, the way the hosted function
/// fills its response.
pub fn build_remote_analysis(text: String) -> RemoteAnalysis {
    let field = |name: &str| extract_field(&text, name);

    let signal_type = field("SIGNAL TYPE");
    let confidence = declared_confidence(&field("CONFIDENCE"));
    let details = RemoteDetails {
        entry_point: Some(field("ENTRY POINT")),
        target_price: Some(field("TARGET PRICE")),
        stop_loss: Some(field("STOP LOSS")),
        risk_level: Some(field("RISK ASSESSMENT")),
        timeframe: Some(field("TIMEFRAME")),
        reasoning: Some(field("REASONING")),
        analysis: Some(field("ANALYSIS")),
    };

    RemoteAnalysis {
        signal_type: Some(signal_type),
        confidence,
        details: Some(details),
        content: text,
    }
}

/// Leading integer of the confidence value; an empty value means the fallback, a
/// value without leading digits means no confidence.
fn declared_confidence(raw: &str) -> Option<f64> {
    let raw = raw.replace('%', "");
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(FALLBACK_CONFIDENCE);
    }

    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().ok().map(f64::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::ImageFormat;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const MODEL_TEXT: &str = "### SIGNAL TYPE\nSELL\n\n### CONFIDENCE\n72%\n\n### ENTRY POINT\n1.0850\n\n### STOP LOSS\n1.0870\n\n### TIMEFRAME\n2 perc";

    fn client(server: &MockServer) -> VisionClient {
        VisionClient::new(server.uri(), "sk-test", "vision-model", 1500, Duration::from_secs(5))
            .unwrap()
    }

    fn image() -> ImagePayload {
        ImagePayload::from_bytes(b"GIF89a", ImageFormat::Gif).unwrap()
    }

    #[test]
    fn test_build_remote_analysis_extracts_fields() {
        let analysis = build_remote_analysis(MODEL_TEXT.to_string());
        assert_eq!(analysis.signal_type.as_deref(), Some("SELL"));
        assert_eq!(analysis.confidence, Some(72.0));

        let details = analysis.details.unwrap();
        assert_eq!(details.entry_point.as_deref(), Some("1.0850"));
        assert_eq!(details.stop_loss.as_deref(), Some("1.0870"));
        assert_eq!(details.target_price.as_deref(), Some(""));
        assert_eq!(details.timeframe.as_deref(), Some("2 perc"));
    }

    #[test]
    fn test_declared_confidence_rules() {
        assert_eq!(declared_confidence(""), Some(50.0));
        assert_eq!(declared_confidence("85%"), Some(85.0));
        assert_eq!(declared_confidence("70 (közepes)"), Some(70.0));
        assert_eq!(declared_confidence("magas"), None);
    }

    #[tokio::test]
    async fn test_analyze_sends_prompt_and_image() {
        let server = MockServer::start().await;
        let image = image();
        let expected_url = image.data_url().to_string();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(move |req: &Request| {
                let body: serde_json::Value = match serde_json::from_slice(&req.body) {
                    Ok(v) => v,
                    Err(_) => return false,
                };
                let content = &body["messages"][0]["content"];
                body["model"] == "vision-model"
                    && body["max_completion_tokens"] == 1500
                    && content[0]["type"] == "text"
                    && content[1]["type"] == "image_url"
                    && content[1]["image_url"]["url"] == expected_url.as_str()
            })
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": MODEL_TEXT } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let analysis = client(&server)
            .analyze(&image, &AuthSession::new("u", "t"))
            .await
            .unwrap();
        assert_eq!(analysis.content, MODEL_TEXT);
        assert_eq!(analysis.signal_type.as_deref(), Some("SELL"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "message": "model overloaded" }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .analyze(&image(), &AuthSession::new("u", "t"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API error 500: Failed to analyze screenshot");
    }

    #[tokio::test]
    async fn test_empty_choices_is_missing_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client(&server)
            .analyze(&image(), &AuthSession::new("u", "t"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MissingPayload));
    }
}
