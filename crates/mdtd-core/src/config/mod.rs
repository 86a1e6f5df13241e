//! Configuration system for MDTD.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod language_config;
pub mod mdtd_config;
pub mod scan_config;
pub mod synthesis_config;

pub use language_config::LanguageConfig;
pub use mdtd_config::{CliOverrides, MdtdConfig};
pub use scan_config::ScanConfig;
pub use synthesis_config::SynthesisConfig;
