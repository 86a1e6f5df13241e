//! mdtd-core: shared foundation for the MDTD scenario engine.
//!
//! Holds the per-subsystem error enums, the layered TOML configuration,
//! tracing initialisation and collection aliases. Parsing and synthesis
//! live in `mdtd-analysis`.

pub mod config;
pub mod errors;
pub mod tracing;
pub mod types;

pub use config::MdtdConfig;
pub use errors::{ConfigError, MdtdErrorCode, PipelineError, ScanError};
