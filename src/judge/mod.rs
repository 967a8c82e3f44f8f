//! Submission pipeline.
//!
//! A [`Submission`] goes through wrap, compile, load, resolve and invoke
//! inside its own [`Workspace`], under one [`Deadline`] that starts before
//! compilation. [`Judge`] wires the stages together; each stage lives in its
//! own module and can be driven on its own.

pub mod compiler;
pub mod invoker;
pub mod loader;
pub mod marshal;
pub mod reference;
pub mod resolver;
pub mod wrapper;

use crate::config::types::{AlgorithmHint, Result};
use crate::config::validator::validate_config;
use crate::config::ExecutorConfig;
use crate::exec::deadline::Deadline;
use crate::observability::audit;
use crate::safety::workspace::{Workspace, WorkspaceManager};
use crate::verdict::{ExecutionOutcome, TestReport};
use compiler::CompilerInvoker;
use invoker::Invoker;
use loader::ArtifactLoader;
use reference::ReferenceSort;
use resolver::EntryPointResolver;
use std::time::Instant;

/// Caller-provided source text plus an optional algorithm hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub source: String,
    pub hint: Option<AlgorithmHint>,
}

impl Submission {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: AlgorithmHint) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Attach a hint by its platform name; unrecognised names leave it unset.
    pub fn with_hint_str(mut self, hint: &str) -> Self {
        self.hint = AlgorithmHint::parse_lenient(hint);
        if self.hint.is_none() {
            log::debug!("ignoring unrecognised algorithm hint '{}'", hint);
        }
        self
    }
}

/// Runs submissions. Holds no per-run state, so one `Judge` can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct Judge {
    config: ExecutorConfig,
    workspaces: WorkspaceManager,
}

impl Judge {
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        let validation = validate_config(&config)?;
        for warning in &validation.warnings {
            log::warn!("config: {}", warning);
        }

        let workspaces = WorkspaceManager::new(config.scratch_root.clone())?;
        Ok(Self { config, workspaces })
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Compile `submission`, call its entry point once on a copy of `input`
    /// and return the argument state after the call.
    pub fn execute(&self, submission: &Submission, input: &[i32]) -> Result<Vec<i32>> {
        let deadline = Deadline::start(self.config.time_limit());
        let mut workspace = self.workspaces.create_workspace()?;
        workspace.keep(self.config.keep_workspace);
        let run_id = workspace.run_id();

        let result = self.execute_in(submission, input, &mut workspace, &deadline);
        match &result {
            Ok(values) => log::info!(
                "run {} succeeded in {} ms ({} values)",
                run_id,
                deadline.elapsed().as_millis(),
                values.len()
            ),
            Err(e) => {
                log::info!("run {} failed with {}", run_id, e.kind());
                audit::execution_failed(&run_id, e, deadline.elapsed());
            }
        }
        result
    }

    fn execute_in(
        &self,
        submission: &Submission,
        input: &[i32],
        workspace: &mut Workspace,
        deadline: &Deadline,
    ) -> Result<Vec<i32>> {
        let run_id = workspace.run_id();
        let toolchain = &self.config.toolchain;
        let limits = &self.config.output;

        let wrapped = wrapper::wrap(&submission.source);
        audit::submission_received(
            &run_id,
            wrapped.mode,
            submission.hint,
            &toolchain.envelope_id(),
        );

        let compile_started = Instant::now();
        let artifact = CompilerInvoker::new(toolchain, limits).compile(&wrapped, workspace, deadline)?;
        audit::compile_finished(&run_id, &artifact.crate_name, compile_started.elapsed());

        let unit = ArtifactLoader::load(&artifact)?;
        let entry = EntryPointResolver::resolve(&unit, submission.hint)?;
        audit::entry_point_resolved(&run_id, &entry);

        let call_started = Instant::now();
        let result = Invoker::new(toolchain, limits).invoke(&unit, &entry, input, workspace, deadline)?;
        audit::invocation_finished(&run_id, result.len(), call_started.elapsed());

        Ok(result)
    }

    /// [`Judge::execute`] folded into a tagged outcome.
    pub fn run(&self, submission: &Submission, input: &[i32]) -> ExecutionOutcome {
        ExecutionOutcome::from(self.execute(submission, input))
    }

    /// Run `submission` and pair its outcome with `reference`'s result for the
    /// same input.
    pub fn compile_and_test(
        &self,
        submission: &Submission,
        input: &[i32],
        reference: &dyn ReferenceSort,
    ) -> TestReport {
        let submitted = self.run(submission, input);
        let expected = reference.sort(input);
        TestReport {
            input: input.to_vec(),
            submitted,
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::SortboxError;

    #[test]
    fn hint_str_is_lenient() {
        let submission = Submission::new("arr.sort();").with_hint_str("quickSort");
        assert_eq!(submission.hint, Some(AlgorithmHint::QuickSort));

        let submission = Submission::new("arr.sort();").with_hint_str("stoogeSort");
        assert_eq!(submission.hint, None);
    }

    #[test]
    fn judge_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExecutorConfig::default()
            .with_scratch_root(dir.path())
            .with_time_limit_ms(0);
        assert!(matches!(Judge::new(config), Err(SortboxError::Config(_))));
    }

    #[test]
    fn missing_toolchain_is_internal_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ExecutorConfig::default().with_scratch_root(dir.path());
        config.toolchain.rustc = "/nonexistent/sortbox-rustc".to_string();
        let judge = Judge::new(config).unwrap();

        let outcome = judge.run(&Submission::new("arr.sort();"), &[2, 1]);
        assert_eq!(
            outcome.failure_kind(),
            Some(crate::config::types::FailureKind::Internal)
        );
        // The workspace is gone once the run returns.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
