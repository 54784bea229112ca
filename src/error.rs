//! Error types for the installation workflow.

/// Error type for a single artifact download.
///
/// The fetcher never panics past this boundary; callers decide remediation.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for installation workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Materialization failed: {0}")]
    Materialize(String),

    #[error("Script generation failed: {0}")]
    Scripts(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
