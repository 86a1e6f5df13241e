//! Language selection configuration.

use serde::{Deserialize, Serialize};

/// Which languages take part in a run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LanguageConfig {
    /// Language names whose files are skipped (e.g. `["go", "cpp"]`).
    pub disabled: Vec<String>,
}
