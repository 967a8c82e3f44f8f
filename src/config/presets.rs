/// Toolchain envelope
///
/// The compile command for submissions and launchers is derived from one
/// explicit, serialisable preset so the exact rustc invocation can be recorded
/// next to a result.
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Editions rustc accepts for `--edition`.
pub const SUPPORTED_EDITIONS: [&str; 4] = ["2015", "2018", "2021", "2024"];

/// Environment variable overriding the rustc executable.
pub const RUSTC_ENV: &str = "SORTBOX_RUSTC";

/// Rust toolchain preset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RustToolchain {
    /// Compiler executable (looked up on `PATH` when not absolute)
    pub rustc: String,
    /// Language edition passed to `--edition`
    pub edition: String,
    /// `-C opt-level`
    pub opt_level: u8,
    /// Keep integer overflow checks on in optimised builds
    pub overflow_checks: bool,
    /// Extra arguments appended to every rustc invocation
    pub extra_args: Vec<String>,
}

impl Default for RustToolchain {
    fn default() -> Self {
        Self {
            rustc: "rustc".to_string(),
            edition: "2021".to_string(),
            opt_level: 1,
            overflow_checks: true,
            extra_args: Vec::new(),
        }
    }
}

impl RustToolchain {
    /// Default preset with the `SORTBOX_RUSTC` override applied.
    pub fn from_env() -> Self {
        let mut toolchain = Self::default();
        toolchain.apply_env_override();
        toolchain
    }

    pub fn apply_env_override(&mut self) {
        if let Ok(rustc) = std::env::var(RUSTC_ENV) {
            if !rustc.trim().is_empty() {
                self.rustc = rustc;
            }
        }
    }

    /// Identifier recorded in audit events, e.g. `rustc-2021-O1`.
    pub fn envelope_id(&self) -> String {
        format!("rustc-{}-O{}", self.edition, self.opt_level)
    }

    /// Arguments shared by library and launcher builds.
    fn common_args(&self, search_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "--edition".to_string(),
            self.edition.clone(),
            "--color".to_string(),
            "never".to_string(),
            "-C".to_string(),
            format!("opt-level={}", self.opt_level),
            "-L".to_string(),
            search_dir.to_string_lossy().to_string(),
        ];
        if self.overflow_checks {
            args.push("-C".to_string());
            args.push("overflow-checks=on".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// `rustc` argv producing an rlib named `crate_name` from `source`.
    pub fn library_command(
        &self,
        crate_name: &str,
        source: &Path,
        output: &Path,
        search_dir: &Path,
    ) -> Vec<String> {
        let mut argv = vec![
            self.rustc.clone(),
            "--crate-type".to_string(),
            "rlib".to_string(),
            "--crate-name".to_string(),
            crate_name.to_string(),
        ];
        argv.extend(self.common_args(search_dir));
        argv.push("-o".to_string());
        argv.push(output.to_string_lossy().to_string());
        argv.push(source.to_string_lossy().to_string());
        argv
    }

    /// `rustc` argv linking the launcher against the submission rlib.
    pub fn launcher_command(
        &self,
        library_crate: &str,
        library: &Path,
        source: &Path,
        output: &Path,
        search_dir: &Path,
    ) -> Vec<String> {
        let mut argv = vec![
            self.rustc.clone(),
            "--crate-type".to_string(),
            "bin".to_string(),
            "--crate-name".to_string(),
            "launcher".to_string(),
            "--extern".to_string(),
            format!("{}={}", library_crate, library.to_string_lossy()),
        ];
        argv.extend(self.common_args(search_dir));
        argv.push("-o".to_string());
        argv.push(output.to_string_lossy().to_string());
        argv.push(source.to_string_lossy().to_string());
        argv
    }
}
