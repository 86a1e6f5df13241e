//! Scanner configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Configuration for the file scanner.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns excluded from directory walks, matched against paths
    /// relative to the analysis root.
    pub exclude: Vec<String>,
    /// Maximum file size in bytes. Default: 1 MiB.
    pub max_file_size: Option<u64>,
    /// Number of worker threads. 0 = rayon default.
    pub threads: Option<usize>,
    /// Honour `.gitignore` files during the walk. Default: true.
    pub respect_gitignore: Option<bool>,
}

impl ScanConfig {
    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }

    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or(0)
    }

    pub fn effective_respect_gitignore(&self) -> bool {
        self.respect_gitignore.unwrap_or(true)
    }
}
