// Library crate - analysis core, price source and HTTP surface

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod fmp;
pub mod service;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use error::{AnalysisError, ServiceError, SourceError};
pub use service::{StopLossService, SymbolReport};
pub use types::*;
