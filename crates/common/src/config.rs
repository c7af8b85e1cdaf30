use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ANALYSIS_FUNCTION: &str = "analyze-screenshot";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_VISION_MODEL: &str = "gpt-5-2025-08-07";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process configuration, read once at startup and handed to the components that need it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: String,
    pub backend_anon_key: String,
    pub analysis_function: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub vision_model: String,
    pub vision_max_tokens: u32,
    pub request_timeout: Duration,
    pub progress_tick: Duration,
    pub progress_ceiling: f64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_url = get("BACKEND_URL")
            .ok_or(ConfigError::Missing("BACKEND_URL"))?
            .trim_end_matches('/')
            .to_string();
        let backend_anon_key = get("BACKEND_ANON_KEY").ok_or(ConfigError::Missing("BACKEND_ANON_KEY"))?;

        let progress_ceiling: f64 = parse_or(get("PROGRESS_CEILING"), "PROGRESS_CEILING", 90.0)?;
        if !(0.0..100.0).contains(&progress_ceiling) {
            return Err(ConfigError::Invalid {
                name: "PROGRESS_CEILING",
                reason: format!("{progress_ceiling} is outside 0..100"),
            });
        }

        let progress_tick_ms: u64 = parse_or(get("PROGRESS_TICK_MS"), "PROGRESS_TICK_MS", 300)?;
        if progress_tick_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "PROGRESS_TICK_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            backend_url,
            backend_anon_key,
            analysis_function: get("ANALYSIS_FUNCTION")
                .unwrap_or_else(|| DEFAULT_ANALYSIS_FUNCTION.to_string()),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            vision_model: get("VISION_MODEL").unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            vision_max_tokens: parse_or(get("VISION_MAX_TOKENS"), "VISION_MAX_TOKENS", 1500)?,
            request_timeout: Duration::from_secs(parse_or(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                60,
            )?),
            progress_tick: Duration::from_millis(progress_tick_ms),
            progress_ceiling,
        })
    }
}

fn parse_or<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
