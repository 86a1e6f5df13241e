//! Language adapter errors.

use super::error_code::{self, MdtdErrorCode};

/// Errors from the adapter layer itself, as opposed to malformed input
/// (which is reported as a parse failure on the file outcome).
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Grammar for {language} could not be loaded: {message}")]
    GrammarLoad { language: String, message: String },

    #[error("No adapter registered for {language}")]
    Unsupported { language: String },
}

impl MdtdErrorCode for AdapterError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::GrammarLoad { .. } => error_code::ADAPTER_ERROR,
            Self::Unsupported { .. } => error_code::UNSUPPORTED_LANGUAGE,
        }
    }
}
