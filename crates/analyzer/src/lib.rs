pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod render;

pub use error::{AnalysisError, ErrorCategory, OutcomeError, PreconditionError};
pub use orchestrator::{AnalysisOrchestrator, AnalysisState, CompletedAnalysis, OrchestratorConfig};
pub use progress::{ProgressCurve, ProgressTicker};
