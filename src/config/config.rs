use crate::config::presets::RustToolchain;
use crate::config::types::{Result, SortboxError};
use crate::utils::output::OutputLimits;
/// Executor configuration, loadable from a JSON file
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default ceiling for one submission, compile through call return.
pub const DEFAULT_TIME_LIMIT_MS: u64 = 5000;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Wall-clock budget for a whole invocation (milliseconds)
    pub time_limit_ms: u64,
    /// Parent directory of the per-invocation workspaces
    pub scratch_root: PathBuf,
    /// Compiler preset
    pub toolchain: RustToolchain,
    /// Bounds on captured diagnostics and callee output
    pub output: OutputLimits,
    /// Leave workspaces on disk after the call (debugging only)
    pub keep_workspace: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: DEFAULT_TIME_LIMIT_MS,
            scratch_root: default_scratch_root(),
            toolchain: RustToolchain::from_env(),
            output: OutputLimits::default(),
            keep_workspace: false,
        }
    }
}

pub fn default_scratch_root() -> PathBuf {
    std::env::temp_dir().join("sortbox")
}

impl ExecutorConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.time_limit_ms = time_limit_ms;
        self
    }

    pub fn with_scratch_root(mut self, scratch_root: impl Into<PathBuf>) -> Self {
        self.scratch_root = scratch_root.into();
        self
    }

    /// Load configuration from a JSON file; missing fields take defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SortboxError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut config: ExecutorConfig = serde_json::from_str(&content).map_err(|e| {
            SortboxError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        config.toolchain.apply_env_override();

        Ok(config)
    }
}
