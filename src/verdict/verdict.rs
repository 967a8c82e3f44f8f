/// Outcome classification
///
/// Every pipeline run ends in exactly one of these; there is no partial or
/// success-with-warnings state.
use crate::config::types::{FailureKind, Result, SortboxError};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Success { result: Vec<i32> },
    Failure { kind: FailureKind, message: String },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    pub fn result(&self) -> Option<&[i32]> {
        match self {
            ExecutionOutcome::Success { result } => Some(result),
            ExecutionOutcome::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ExecutionOutcome::Success { .. } => None,
            ExecutionOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<SortboxError> for ExecutionOutcome {
    fn from(err: SortboxError) -> Self {
        ExecutionOutcome::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<Result<Vec<i32>>> for ExecutionOutcome {
    fn from(result: Result<Vec<i32>>) -> Self {
        match result {
            Ok(result) => ExecutionOutcome::Success { result },
            Err(err) => err.into(),
        }
    }
}

/// Submitted result next to the reference result for the same input.
///
/// Deciding what counts as a pass is up to the caller; [`TestReport::matches`]
/// is the plain equality check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub input: Vec<i32>,
    pub submitted: ExecutionOutcome,
    pub expected: Vec<i32>,
}

impl TestReport {
    pub fn matches(&self) -> bool {
        self.submitted.result() == Some(self.expected.as_slice())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
