use thiserror::Error;

/// Error type shared by the engine, the configuration loader and the fleet pool.
///
/// Every variant is local and non-retryable: they describe bad input shape or
/// bad configuration, never a transient resource failure.
#[derive(Error, Debug)]
pub enum KpiError {
    /// The failure category table has no entry for the requested unit
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// Malformed timestamps, non-monotonic sequences, unknown event codes
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O related failure
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while parsing YAML configuration files
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error while parsing JSON input batches
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker pool failure (panicked or cancelled task)
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Convenient alias over [`Result`] using [`KpiError`]
pub type Result<T> = std::result::Result<T, KpiError>;
