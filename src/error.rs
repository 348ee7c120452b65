use std::path::PathBuf;
use thiserror::Error;

/// Errors produced along the name -> boundary -> request -> image pipeline.
#[derive(Debug, Error)]
pub enum MapError {
    /// The resolver knows no region by this name.
    #[error("Region not found: {0}")]
    RegionNotFound(String),

    /// The region resolved but carries no boundary polygon.
    #[error("Region {0} has no boundary data")]
    NoBoundaryData(String),

    /// Serialized request would exceed the provider's URL ceiling.
    #[error("Request length {length} exceeds the provider limit of {ceiling}")]
    RequestTooLarge { length: usize, ceiling: usize },

    /// Structured error returned by the provider.
    #[error("Provider error {code}: {message}")]
    Provider { code: u32, message: String },

    /// Network failure or timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response was neither an image nor a structured provider error.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// A request without overlay has no center or zoom to fall back on.
    #[error("Incomplete map request: {0}")]
    IncompleteRequest(String),

    #[error("Failed to write {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}
