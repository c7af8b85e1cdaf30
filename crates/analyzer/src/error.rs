use backend::BackendError;
use thiserror::Error;

/// Why an analysis could not start.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("No image to analyze")]
    NoImage,

    #[error("User is not signed in")]
    NotAuthenticated,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("analysis request failed: {0}")]
    Transport(BackendError),

    #[error("Invalid response from analysis service")]
    Schema,

    #[error("an analysis is already in progress")]
    Busy,

    #[error("analysis was cleared before it finished")]
    Cleared,
}

/// Coarse buckets the user-facing message is chosen from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Authentication,
    InvalidImage,
    RateLimited,
    Generic,
}

impl ErrorCategory {
    /// Classifies a failure message by substring, falling back to `Generic`.
    pub fn from_message(message: &str) -> Self {
        let message = message.to_lowercase();
        if message.contains("unauthorized") {
            Self::Authentication
        } else if message.contains("invalid image") || message.contains("too large") {
            Self::InvalidImage
        } else if message.contains("rate limit") {
            Self::RateLimited
        } else {
            Self::Generic
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication error. Please sign in again.",
            Self::InvalidImage => {
                "Invalid image format. Please use JPEG, PNG, GIF, or WebP format, max 10MB."
            }
            Self::RateLimited => "Too many requests. Please try again later.",
            Self::Generic => "Analysis failed. Please try again.",
        }
    }
}

impl From<BackendError> for AnalysisError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::MissingPayload => Self::Schema,
            other => Self::Transport(other),
        }
    }
}

impl AnalysisError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Precondition(PreconditionError::NotAuthenticated) => ErrorCategory::Authentication,
            Self::Precondition(PreconditionError::NoImage) => ErrorCategory::Generic,
            Self::Transport(BackendError::InvalidImage(_)) => ErrorCategory::InvalidImage,
            Self::Transport(BackendError::Api { status: 401, .. }) => ErrorCategory::Authentication,
            Self::Transport(BackendError::Api { status: 429, .. }) => ErrorCategory::RateLimited,
            Self::Transport(err) => ErrorCategory::from_message(&err.to_string()),
            Self::Schema | Self::Busy | Self::Cleared => ErrorCategory::Generic,
        }
    }

    /// Message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Precondition(PreconditionError::NotAuthenticated) => {
                "Please sign in to analyze images."
            }
            Self::Precondition(PreconditionError::NoImage) => "Please upload an image first.",
            Self::Busy => "An analysis is already running.",
            _ => self.category().user_message(),
        }
    }
}

/// Why a trade outcome could not be recorded.
#[derive(Debug, Error)]
pub enum OutcomeError {
    #[error("there is no completed analysis to mark")]
    NoAnalysis,

    #[error("this analysis was already marked as a {0}")]
    AlreadyMarked(common::models::TradeOutcome),

    #[error("failed to update trading statistics: {0}")]
    Stats(#[from] BackendError),
}
