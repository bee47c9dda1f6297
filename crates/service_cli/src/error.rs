//! CLI error types.

use thiserror::Error;

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced by the `simm` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Command line argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// CRIF file content could not be interpreted.
    #[error("CRIF line {line}: {message}")]
    Crif {
        /// One-based line number, header included.
        line: u64,
        /// What was wrong with the line.
        message: String,
    },

    /// SIMM calculation failed.
    #[error(transparent)]
    Simm(#[from] pricer_simm::SimmError),

    /// Run configuration could not be parsed.
    #[error("Configuration file error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
