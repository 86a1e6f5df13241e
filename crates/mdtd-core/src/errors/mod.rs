//! Error handling for MDTD.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.
//!
//! Parse failures and skipped synthesis categories are not errors here:
//! they are recorded as data on the per-file outcome so a run never aborts
//! because one file is malformed.

pub mod adapter_error;
pub mod config_error;
pub mod error_code;
pub mod pipeline_error;
pub mod scan_error;

pub use adapter_error::AdapterError;
pub use config_error::ConfigError;
pub use error_code::MdtdErrorCode;
pub use pipeline_error::PipelineError;
pub use scan_error::ScanError;
