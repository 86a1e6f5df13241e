//! Pipeline errors.

use super::error_code::MdtdErrorCode;
use super::{AdapterError, ConfigError, ScanError};

/// Errors that abort a coordinator run.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

impl MdtdErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Scan(e) => e.error_code(),
            Self::Adapter(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::error_code;

    #[test]
    fn pipeline_error_forwards_subsystem_code() {
        let err: PipelineError = ConfigError::invalid("synthesis.max_combinations_per_unit", "too small").into();
        assert_eq!(err.error_code(), error_code::CONFIG_ERROR);

        let err: PipelineError = AdapterError::Unsupported {
            language: "cobol".into(),
        }
        .into();
        assert_eq!(err.error_code(), error_code::UNSUPPORTED_LANGUAGE);
        assert!(err.coded_message().starts_with("[UNSUPPORTED_LANGUAGE]"));
    }
}
