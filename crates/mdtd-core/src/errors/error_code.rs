//! MdtdErrorCode trait for structured error reporting.

/// Every error enum implements this to expose a stable code string that the
/// CLI prints ahead of the human-readable message.
pub trait MdtdErrorCode {
    /// Returns the error code string (e.g., "SCAN_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_message(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const SCAN_ERROR: &str = "SCAN_ERROR";
pub const ADAPTER_ERROR: &str = "ADAPTER_ERROR";
pub const UNSUPPORTED_LANGUAGE: &str = "UNSUPPORTED_LANGUAGE";
pub const PARSE_FAILURE: &str = "PARSE_FAILURE";
pub const PIPELINE_ERROR: &str = "PIPELINE_ERROR";
