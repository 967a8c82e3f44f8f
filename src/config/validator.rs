// Config validation
// Runs before any workspace is created so a bad configuration fails fast
// with an actionable message instead of surfacing as a compile or timeout error.

use crate::config::config::ExecutorConfig;
use crate::config::presets::SUPPORTED_EDITIONS;
use crate::config::types::{Result, SortboxError};

/// Validation result with detailed errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate config; errors are fatal, warnings are returned to the caller.
pub fn validate_config(config: &ExecutorConfig) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_limits(config, &mut result);
    validate_toolchain(config, &mut result);
    validate_paths(config, &mut result);

    if !result.is_valid() {
        return Err(SortboxError::Config(format!(
            "Config validation failed:\n{}",
            result.errors.join("\n")
        )));
    }

    Ok(result)
}

fn validate_limits(config: &ExecutorConfig, result: &mut ValidationResult) {
    if config.time_limit_ms == 0 {
        result.add_error("time_limit_ms must be greater than zero".to_string());
    } else if config.time_limit_ms < 500 {
        result.add_warning(format!(
            "time_limit_ms={} leaves little room for compilation",
            config.time_limit_ms
        ));
    }

    let output = &config.output;
    if output.stdout_limit == 0 || output.stderr_limit == 0 {
        result.add_error("output stream limits must be greater than zero".to_string());
    }
    if output.combined_limit < output.stderr_limit {
        result.add_warning(
            "combined output limit is smaller than the stderr limit; diagnostics may be cut"
                .to_string(),
        );
    }
}

fn validate_toolchain(config: &ExecutorConfig, result: &mut ValidationResult) {
    let toolchain = &config.toolchain;
    if toolchain.rustc.trim().is_empty() {
        result.add_error("toolchain.rustc must name an executable".to_string());
    }
    if !SUPPORTED_EDITIONS.contains(&toolchain.edition.as_str()) {
        result.add_error(format!(
            "toolchain.edition '{}' is not one of {:?}",
            toolchain.edition, SUPPORTED_EDITIONS
        ));
    }
    if toolchain.opt_level > 3 {
        result.add_error(format!(
            "toolchain.opt_level {} is out of range 0..=3",
            toolchain.opt_level
        ));
    }
}

fn validate_paths(config: &ExecutorConfig, result: &mut ValidationResult) {
    if config.scratch_root.as_os_str().is_empty() {
        result.add_error("scratch_root must not be empty".to_string());
    } else if config.scratch_root.is_file() {
        result.add_error(format!(
            "scratch_root {} exists and is a file",
            config.scratch_root.display()
        ));
    }
    if config.keep_workspace {
        result.add_warning("keep_workspace is set; workspaces will accumulate".to_string());
    }
}
