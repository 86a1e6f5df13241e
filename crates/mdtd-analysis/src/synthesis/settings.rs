//! Resolved synthesis settings, built once per run from `SynthesisConfig`.

use std::collections::BTreeSet;

use mdtd_core::config::synthesis_config::{
    DEFAULT_MAX_COMBINATIONS_PER_UNIT, DEFAULT_MAX_STATE_CHAINS, MAX_MAX_COMBINATIONS_PER_UNIT,
    MAX_STATE_CHAINS_LIMIT, MIN_MAX_COMBINATIONS_PER_UNIT,
};
use mdtd_core::config::SynthesisConfig;
use mdtd_core::errors::ConfigError;

use super::types::ScenarioCategory;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisSettings {
    /// Ceiling on valid equivalence combinations per unit.
    pub max_combinations_per_unit: usize,
    pub enabled: BTreeSet<ScenarioCategory>,
    pub max_state_chains: usize,
    pub synthesize_partial: bool,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            max_combinations_per_unit: DEFAULT_MAX_COMBINATIONS_PER_UNIT,
            enabled: ScenarioCategory::ALL.iter().copied().collect(),
            max_state_chains: DEFAULT_MAX_STATE_CHAINS,
            synthesize_partial: false,
        }
    }
}

impl SynthesisSettings {
    /// Resolve and validate. Unknown category names, an empty category list
    /// and out-of-range numbers are configuration errors.
    pub fn from_config(config: &SynthesisConfig) -> Result<Self, ConfigError> {
        let max = config.effective_max_combinations_per_unit();
        if !(MIN_MAX_COMBINATIONS_PER_UNIT..=MAX_MAX_COMBINATIONS_PER_UNIT).contains(&max) {
            return Err(ConfigError::ValidationFailed {
                field: "synthesis.max_combinations_per_unit".to_string(),
                message: format!(
                    "must be between {MIN_MAX_COMBINATIONS_PER_UNIT} and {MAX_MAX_COMBINATIONS_PER_UNIT}, got {max}"
                ),
            });
        }

        let names = config.effective_enabled_categories();
        if names.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "synthesis.enabled_categories".to_string(),
                message: "at least one category must be enabled".to_string(),
            });
        }
        let mut enabled = BTreeSet::new();
        for name in &names {
            let category = ScenarioCategory::from_name(name).ok_or_else(|| {
                let known: Vec<&str> = ScenarioCategory::ALL.iter().map(|c| c.name()).collect();
                ConfigError::invalid(
                    "synthesis.enabled_categories",
                    format!("unknown category '{name}' (expected one of {})", known.join(", ")),
                )
            })?;
            enabled.insert(category);
        }

        let chains = config.effective_max_state_chains();
        if !(1..=MAX_STATE_CHAINS_LIMIT).contains(&chains) {
            return Err(ConfigError::ValidationFailed {
                field: "synthesis.max_state_chains".to_string(),
                message: format!("must be between 1 and {MAX_STATE_CHAINS_LIMIT}, got {chains}"),
            });
        }

        Ok(Self {
            max_combinations_per_unit: max,
            enabled,
            max_state_chains: chains,
            synthesize_partial: config.effective_synthesize_partial(),
        })
    }

    pub fn is_enabled(&self, category: ScenarioCategory) -> bool {
        self.enabled.contains(&category)
    }

    pub fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.max_combinations_per_unit = ceiling;
        self
    }

    pub fn with_categories(mut self, categories: &[ScenarioCategory]) -> Self {
        self.enabled = categories.iter().copied().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let s = SynthesisSettings::from_config(&SynthesisConfig::default()).unwrap();
        assert_eq!(s, SynthesisSettings::default());
        assert_eq!(s.enabled.len(), 4);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let config = SynthesisConfig {
            enabled_categories: Some(vec!["boundary_value".into(), "mutation".into()]),
            ..Default::default()
        };
        let err = SynthesisSettings::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("mutation"));
    }

    #[test]
    fn empty_category_list_is_rejected() {
        let config = SynthesisConfig {
            enabled_categories: Some(Vec::new()),
            ..Default::default()
        };
        assert!(matches!(
            SynthesisSettings::from_config(&config),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn ceiling_bounds_are_enforced() {
        for bad in [0, 15, 10_001] {
            let config = SynthesisConfig {
                max_combinations_per_unit: Some(bad),
                ..Default::default()
            };
            assert!(SynthesisSettings::from_config(&config).is_err(), "{bad} accepted");
        }
    }
}
