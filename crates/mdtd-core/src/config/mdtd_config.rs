//! Top-level MDTD configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::synthesis_config::{
    MAX_MAX_COMBINATIONS_PER_UNIT, MAX_STATE_CHAINS_LIMIT, MIN_MAX_COMBINATIONS_PER_UNIT,
};
use super::{LanguageConfig, ScanConfig, SynthesisConfig};
use crate::errors::ConfigError;

/// Project config file looked up in the analysis root.
pub const PROJECT_CONFIG_FILE: &str = "mdtd.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`MDTD_*`)
/// 3. Project config (`mdtd.toml` in the analysis root, or an explicit file)
/// 4. User config (`~/.mdtd/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MdtdConfig {
    pub synthesis: SynthesisConfig,
    pub languages: LanguageConfig,
    pub scan: ScanConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub max_combinations_per_unit: Option<usize>,
    pub enabled_categories: Option<Vec<String>>,
    pub disabled_languages: Vec<String>,
    pub exclude: Vec<String>,
    pub scan_threads: Option<usize>,
    pub synthesize_partial: Option<bool>,
}

impl MdtdConfig {
    /// Load configuration with layered resolution, reading `mdtd.toml` from `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        Self::load_from(root, None, cli_overrides)
    }

    /// Like [`MdtdConfig::load`], but an explicit `config_file` replaces the
    /// project layer. A missing explicit file is an error; a missing
    /// project file is not.
    pub fn load_from(
        root: &Path,
        config_file: Option<&Path>,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                Self::merge_toml_file(&mut config, path)?;
            }
            None => {
                let project_root = if root.is_file() {
                    root.parent().unwrap_or(root)
                } else {
                    root
                };
                let project_config_path = project_root.join(PROJECT_CONFIG_FILE);
                if project_config_path.exists() {
                    Self::merge_toml_file(&mut config, &project_config_path)?;
                }
            }
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config)?;

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    ///
    /// Category and language names are checked where they are resolved into
    /// typed settings; this pass covers ranges and pattern syntax.
    pub fn validate(config: &MdtdConfig) -> Result<(), ConfigError> {
        if let Some(max) = config.synthesis.max_combinations_per_unit {
            if !(MIN_MAX_COMBINATIONS_PER_UNIT..=MAX_MAX_COMBINATIONS_PER_UNIT).contains(&max) {
                return Err(ConfigError::ValidationFailed {
                    field: "synthesis.max_combinations_per_unit".to_string(),
                    message: format!(
                        "must be between {MIN_MAX_COMBINATIONS_PER_UNIT} and {MAX_MAX_COMBINATIONS_PER_UNIT}, got {max}"
                    ),
                });
            }
        }
        if let Some(ref categories) = config.synthesis.enabled_categories {
            if categories.is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "synthesis.enabled_categories".to_string(),
                    message: "at least one category must be enabled".to_string(),
                });
            }
        }
        if let Some(chains) = config.synthesis.max_state_chains {
            if !(1..=MAX_STATE_CHAINS_LIMIT).contains(&chains) {
                return Err(ConfigError::ValidationFailed {
                    field: "synthesis.max_state_chains".to_string(),
                    message: format!("must be between 1 and {MAX_STATE_CHAINS_LIMIT}"),
                });
            }
        }
        if let Some(max_file_size) = config.scan.max_file_size {
            if max_file_size == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "scan.max_file_size".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        for pattern in &config.scan.exclude {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(ConfigError::InvalidValue {
                    field: "scan.exclude".to_string(),
                    message: format!("invalid glob '{pattern}': {e}"),
                });
            }
        }
        Ok(())
    }

    /// Returns the user config path: `~/.mdtd/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        dirs_path().map(|d| d.join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut MdtdConfig, path: &Path) -> Result<(), ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                path: path.display().to_string(),
            })?;

        let file_config: MdtdConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins only where it carries a value.
    fn merge(base: &mut MdtdConfig, other: &MdtdConfig) {
        // Synthesis
        if other.synthesis.max_combinations_per_unit.is_some() {
            base.synthesis.max_combinations_per_unit = other.synthesis.max_combinations_per_unit;
        }
        if other.synthesis.enabled_categories.is_some() {
            base.synthesis.enabled_categories = other.synthesis.enabled_categories.clone();
        }
        if other.synthesis.max_state_chains.is_some() {
            base.synthesis.max_state_chains = other.synthesis.max_state_chains;
        }
        if other.synthesis.synthesize_partial.is_some() {
            base.synthesis.synthesize_partial = other.synthesis.synthesize_partial;
        }

        // Languages
        if !other.languages.disabled.is_empty() {
            base.languages.disabled = other.languages.disabled.clone();
        }

        // Scan
        if !other.scan.exclude.is_empty() {
            base.scan.exclude = other.scan.exclude.clone();
        }
        if other.scan.max_file_size.is_some() {
            base.scan.max_file_size = other.scan.max_file_size;
        }
        if other.scan.threads.is_some() {
            base.scan.threads = other.scan.threads;
        }
        if other.scan.respect_gitignore.is_some() {
            base.scan.respect_gitignore = other.scan.respect_gitignore;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `MDTD_MAX_COMBINATIONS_PER_UNIT`, `MDTD_ENABLED_CATEGORIES=a,b`, etc.
    fn apply_env_overrides(config: &mut MdtdConfig) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("MDTD_MAX_COMBINATIONS_PER_UNIT") {
            let parsed = val.trim().parse::<usize>().map_err(|_| {
                ConfigError::invalid(
                    "MDTD_MAX_COMBINATIONS_PER_UNIT",
                    format!("expected a positive integer, got '{val}'"),
                )
            })?;
            config.synthesis.max_combinations_per_unit = Some(parsed);
        }
        if let Ok(val) = std::env::var("MDTD_ENABLED_CATEGORIES") {
            config.synthesis.enabled_categories = Some(split_list(&val));
        }
        if let Ok(val) = std::env::var("MDTD_DISABLED_LANGUAGES") {
            config.languages.disabled = split_list(&val);
        }
        if let Ok(val) = std::env::var("MDTD_SCAN_THREADS") {
            if let Ok(v) = val.trim().parse::<usize>() {
                config.scan.threads = Some(v);
            }
        }
        if let Ok(val) = std::env::var("MDTD_SCAN_MAX_FILE_SIZE") {
            if let Ok(v) = val.trim().parse::<u64>() {
                config.scan.max_file_size = Some(v);
            }
        }
        Ok(())
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut MdtdConfig, cli: &CliOverrides) {
        if let Some(v) = cli.max_combinations_per_unit {
            config.synthesis.max_combinations_per_unit = Some(v);
        }
        if let Some(ref v) = cli.enabled_categories {
            config.synthesis.enabled_categories = Some(v.clone());
        }
        if let Some(v) = cli.synthesize_partial {
            config.synthesis.synthesize_partial = Some(v);
        }
        // Disabled languages and exclusions accumulate rather than replace.
        for lang in &cli.disabled_languages {
            if !config.languages.disabled.contains(lang) {
                config.languages.disabled.push(lang.clone());
            }
        }
        config.scan.exclude.extend(cli.exclude.iter().cloned());
        if let Some(v) = cli.scan_threads {
            config.scan.threads = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the user-level config directory: `~/.mdtd/`.
fn dirs_path() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".mdtd"))
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
