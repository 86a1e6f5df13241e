//! CLI error types.

use mdtd_core::errors::{ConfigError, MdtdErrorCode, PipelineError};
use thiserror::Error;

/// Fatal errors: each one ends the run with exit code 2.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MdtdErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            CliError::Pipeline(e) => e.error_code(),
            CliError::Io(_) | CliError::Json(_) => "OUTPUT_ERROR",
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Pipeline(e.into())
    }
}

pub type CliResult<T> = Result<T, CliError>;
