pub mod deal;
pub mod error;
pub mod metrics;
pub mod time_value;
pub mod types;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

#[cfg(feature = "analysis")]
pub mod analysis;

pub use error::DealAnalyzerError;
pub use types::*;

/// Standard result type for all deal-analyzer operations
pub type DealResult<T> = Result<T, DealAnalyzerError>;
