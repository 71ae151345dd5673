//! Configuration for the batch module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of concurrent workers.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Directory for converted files. A fresh temporary directory is used
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_pool_size() -> usize {
    8
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            output_dir: None,
        }
    }
}

impl BatchConfig {
    /// Sets the number of workers.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }
}
