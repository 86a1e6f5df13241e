//! Scanner errors.

use std::path::PathBuf;

use super::error_code::{self, MdtdErrorCode};

/// Errors raised while locating and reading source files.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Analysis root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk failed under {root}: {message}")]
    Walk { root: PathBuf, message: String },
}

impl MdtdErrorCode for ScanError {
    fn error_code(&self) -> &'static str {
        error_code::SCAN_ERROR
    }
}
