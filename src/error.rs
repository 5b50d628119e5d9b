// src/error.rs
// =============================================================================
// Error types for the library side.
//
// Extraction and resolution never fail, so everything here comes from the
// configuration or the store.
// =============================================================================

use thiserror::Error;

/// Problems with the configuration file or the storage settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but couldn't be read.
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    /// The config file isn't valid TOML, or has an unknown value such as
    /// an unrecognized inspection level.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A networked backend is selected but a required setting is absent.
    #[error("{backend} report storage needs `{field}` to be set")]
    MissingField {
        backend: &'static str,
        field: &'static str,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors returned by the auditor and the store.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The database couldn't be reached or rejected a query.
    #[error("storage unavailable: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row holds something this version can't interpret.
    #[error("unreadable record: {0}")]
    Decode(String),

    /// The auditor failed to initialize, so nothing can run.
    #[error("link audit is unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for auditor and store operations.
pub type Result<T> = std::result::Result<T, AuditError>;
