//! Scenario synthesis configuration.

use serde::{Deserialize, Serialize};

/// Default pairwise ceiling per callable unit.
pub const DEFAULT_MAX_COMBINATIONS_PER_UNIT: usize = 32;
/// Smallest ceiling accepted; anything lower starves pairwise coverage.
pub const MIN_MAX_COMBINATIONS_PER_UNIT: usize = 16;
pub const MAX_MAX_COMBINATIONS_PER_UNIT: usize = 10_000;
pub const DEFAULT_MAX_STATE_CHAINS: usize = 2;
pub const MAX_STATE_CHAINS_LIMIT: usize = 8;

/// Category names accepted in `enabled_categories`, in emission order.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "equivalence_partition",
    "boundary_value",
    "error_condition",
    "state_transition",
];

/// Configuration for the scenario synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Ceiling on valid equivalence combinations per unit. Default: 32.
    pub max_combinations_per_unit: Option<usize>,
    /// Enabled scenario categories. `None` means all four.
    pub enabled_categories: Option<Vec<String>>,
    /// State-transition scenarios emitted per stateful unit. Default: 2.
    pub max_state_chains: Option<usize>,
    /// Synthesize units recovered from files that failed to parse. Default: false.
    pub synthesize_partial: Option<bool>,
}

impl SynthesisConfig {
    pub fn effective_max_combinations_per_unit(&self) -> usize {
        self.max_combinations_per_unit
            .unwrap_or(DEFAULT_MAX_COMBINATIONS_PER_UNIT)
    }

    pub fn effective_enabled_categories(&self) -> Vec<String> {
        match &self.enabled_categories {
            Some(list) => list.clone(),
            None => DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn effective_max_state_chains(&self) -> usize {
        self.max_state_chains.unwrap_or(DEFAULT_MAX_STATE_CHAINS)
    }

    pub fn effective_synthesize_partial(&self) -> bool {
        self.synthesize_partial.unwrap_or(false)
    }
}
