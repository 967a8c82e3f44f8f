//! Compiler invocation.

use crate::config::presets::RustToolchain;
use crate::config::types::{Result, SortboxError};
use crate::exec::deadline::Deadline;
use crate::exec::process::{run_supervised, ProcessOutput};
use crate::judge::wrapper::WrappedSource;
use crate::safety::workspace::Workspace;
use crate::utils::output::OutputLimits;
use std::path::{Path, PathBuf};

/// File name of the staged crate root inside a workspace.
pub const SOURCE_FILE: &str = "submission.rs";

/// A compiled submission, valid only inside the workspace that produced it.
#[derive(Debug, Clone)]
pub struct CompiledArtifact {
    /// `submission_<token>`, unique per invocation
    pub crate_name: String,
    pub rlib_path: PathBuf,
    pub source_path: PathBuf,
    pub search_dir: PathBuf,
}

pub struct CompilerInvoker<'a> {
    toolchain: &'a RustToolchain,
    limits: &'a OutputLimits,
}

impl<'a> CompilerInvoker<'a> {
    pub fn new(toolchain: &'a RustToolchain, limits: &'a OutputLimits) -> Self {
        Self { toolchain, limits }
    }

    /// Stage `wrapped` in `workspace` and build it into an rlib.
    pub fn compile(
        &self,
        wrapped: &WrappedSource,
        workspace: &mut Workspace,
        deadline: &Deadline,
    ) -> Result<CompiledArtifact> {
        let crate_name = format!("submission_{}", workspace.token());
        let source_path = workspace.write_file(SOURCE_FILE, wrapped.text.as_bytes())?;
        let rlib_path = workspace.path(&format!("lib{}.rlib", crate_name));
        let search_dir = workspace.run_dir().to_path_buf();

        let argv =
            self.toolchain
                .library_command(&crate_name, &source_path, &rlib_path, &search_dir);
        log::debug!("compiling {}: {}", crate_name, argv.join(" "));

        let output = run_supervised(&argv, &search_dir, &[], deadline, self.limits)?;
        check_toolchain_output(&output, deadline, &self.toolchain.rustc)?;

        if !rlib_path.is_file() {
            return Err(SortboxError::Toolchain(format!(
                "{} reported success but produced no artifact at {}",
                self.toolchain.rustc,
                rlib_path.display()
            )));
        }

        Ok(CompiledArtifact {
            crate_name,
            rlib_path,
            source_path,
            search_dir,
        })
    }
}

/// Map a finished rustc run to `Ok`, `Timeout` or `Compile`.
pub(crate) fn check_toolchain_output(
    output: &ProcessOutput,
    deadline: &Deadline,
    rustc: &str,
) -> Result<()> {
    if output.timed_out {
        return Err(deadline.timeout_error());
    }
    if output.success() {
        return Ok(());
    }

    let mut diagnostics = output.output.stderr_lossy().trim_end().to_string();
    if diagnostics.is_empty() {
        diagnostics = format!(
            "{} failed with {} and printed no diagnostics",
            program_name(rustc),
            output.termination()
        );
    }
    diagnostics.push_str(&output.output.stderr_note());
    Err(SortboxError::Compile { diagnostics })
}

fn program_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::wrapper::wrap;
    use std::time::Duration;

    #[test]
    fn test_missing_toolchain_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut workspace = Workspace::new(temp_dir.path()).unwrap();
        let toolchain = RustToolchain {
            rustc: "/nonexistent/rustc".to_string(),
            ..RustToolchain::default()
        };
        let limits = OutputLimits::default();
        let deadline = Deadline::start(Duration::from_secs(10));

        let err = CompilerInvoker::new(&toolchain, &limits)
            .compile(&wrap("arr.sort();"), &mut workspace, &deadline)
            .unwrap_err();
        assert!(matches!(err, SortboxError::Toolchain(_)));
        // Source is staged before the toolchain runs
        assert!(workspace.path(SOURCE_FILE).is_file());
    }

    #[test]
    fn test_failing_toolchain_without_output_still_has_diagnostics() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut workspace = Workspace::new(temp_dir.path()).unwrap();
        let toolchain = RustToolchain {
            rustc: "false".to_string(),
            ..RustToolchain::default()
        };
        let limits = OutputLimits::default();
        let deadline = Deadline::start(Duration::from_secs(10));

        let err = CompilerInvoker::new(&toolchain, &limits)
            .compile(&wrap("arr.sort();"), &mut workspace, &deadline)
            .unwrap_err();
        match err {
            SortboxError::Compile { diagnostics } => {
                assert!(diagnostics.contains("false failed with exit status 1"));
            }
            other => panic!("expected compile error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_diagnostics_are_flagged() {
        use crate::utils::output::{OutputIntegrity, OutputResult};
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        let output = ProcessOutput {
            status: Some(ExitStatus::from_raw(1 << 8)),
            timed_out: false,
            output: OutputResult {
                stdout: Vec::new(),
                stderr: b"error: expected one of".to_vec(),
                stdout_integrity: OutputIntegrity::Complete,
                stderr_integrity: OutputIntegrity::TruncatedByLimit,
            },
        };
        let deadline = Deadline::start(Duration::from_secs(10));

        match check_toolchain_output(&output, &deadline, "rustc") {
            Err(SortboxError::Compile { diagnostics }) => {
                assert!(diagnostics.starts_with("error: expected one of"));
                assert!(diagnostics.ends_with("[stderr truncated_by_limit]"));
            }
            other => panic!("expected compile error, got {:?}", other),
        }
    }
}
