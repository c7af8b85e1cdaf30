pub mod analysis;
pub mod auth;
pub mod image;
pub mod outcome;
pub mod remote;
pub mod signal;

pub use analysis::{DEFAULT_CONFIDENCE, MAX_DETAILS, ParsedAnalysis};
pub use auth::AuthSession;
pub use image::{ImageError, ImageFormat, ImagePayload, MAX_IMAGE_BYTES};
pub use outcome::{TradeOutcome, TradingStats};
pub use remote::{AnalysisEnvelope, RemoteAnalysis, RemoteDetails};
pub use signal::{SignalBasis, SignalClassification, SignalType};
