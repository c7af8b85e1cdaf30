pub mod error;
pub mod remote;
pub mod traits;

pub use error::{BackendError, Result};
pub use remote::{FunctionClient, StatsClient, VisionClient};
pub use traits::{AnalysisBackend, StatsStore};
