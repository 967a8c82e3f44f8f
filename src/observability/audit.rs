/// Structured pipeline events
///
/// Each stage of a run emits one JSON record on the `sortbox::audit` log
/// target, correlated by the workspace run id. Routing and persistence are
/// left to whatever logger the host installs.
use crate::config::types::{AlgorithmHint, SortboxError};
use crate::judge::resolver::CandidateEntryPoint;
use crate::judge::wrapper::WrapMode;
use log::Level;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

pub const AUDIT_TARGET: &str = "sortbox::audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineEventType {
    SubmissionReceived,
    CompileFinished,
    EntryPointResolved,
    InvocationFinished,
    ExecutionFailed,
    WorkspaceCleanup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl PipelineEventType {
    pub fn default_severity(&self) -> Severity {
        match self {
            PipelineEventType::SubmissionReceived
            | PipelineEventType::CompileFinished
            | PipelineEventType::EntryPointResolved
            | PipelineEventType::InvocationFinished
            | PipelineEventType::WorkspaceCleanup => Severity::Info,
            PipelineEventType::ExecutionFailed => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub event_type: PipelineEventType,
    pub severity: Severity,
    pub timestamp: SystemTime,
    pub run_id: String,
    pub elapsed_ms: Option<u64>,
    pub details: String,
}

impl PipelineEvent {
    pub fn new(event_type: PipelineEventType, run_id: &str, details: String) -> Self {
        Self {
            event_type,
            severity: event_type.default_severity(),
            timestamp: SystemTime::now(),
            run_id: run_id.to_string(),
            elapsed_ms: None,
            details,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(elapsed.as_millis() as u64);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "timestamp": self.timestamp
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            "event_type": self.event_type,
            "severity": self.severity,
            "run_id": self.run_id,
            "elapsed_ms": self.elapsed_ms,
            "details": self.details,
            "process_id": std::process::id(),
        })
    }
}

/// Emit `event` through the `log` facade.
pub fn log_event(event: PipelineEvent) {
    let level = match event.severity {
        Severity::Info => Level::Info,
        Severity::Warning => Level::Warn,
        Severity::Error => Level::Error,
    };
    log::log!(target: AUDIT_TARGET, level, "{}", event.to_json());
}

pub fn submission_received(run_id: &str, mode: WrapMode, hint: Option<AlgorithmHint>, envelope: &str) {
    log_event(PipelineEvent::new(
        PipelineEventType::SubmissionReceived,
        run_id,
        format!(
            "mode={:?} hint={} toolchain={}",
            mode,
            hint.map(AlgorithmHint::as_str).unwrap_or("none"),
            envelope
        ),
    ));
}

pub fn compile_finished(run_id: &str, crate_name: &str, elapsed: Duration) {
    log_event(
        PipelineEvent::new(
            PipelineEventType::CompileFinished,
            run_id,
            format!("compiled {}", crate_name),
        )
        .with_elapsed(elapsed),
    );
}

pub fn entry_point_resolved(run_id: &str, entry: &CandidateEntryPoint) {
    log_event(PipelineEvent::new(
        PipelineEventType::EntryPointResolved,
        run_id,
        format!("selected {} (arity {})", entry, entry.arity()),
    ));
}

pub fn invocation_finished(run_id: &str, result_len: usize, elapsed: Duration) {
    log_event(
        PipelineEvent::new(
            PipelineEventType::InvocationFinished,
            run_id,
            format!("returned {} values", result_len),
        )
        .with_elapsed(elapsed),
    );
}

pub fn execution_failed(run_id: &str, err: &SortboxError, elapsed: Duration) {
    let severity = match err {
        SortboxError::Io(_) | SortboxError::Config(_) | SortboxError::Toolchain(_) => {
            Severity::Error
        }
        _ => Severity::Warning,
    };
    // Diagnostics can be long; the first line is enough to correlate.
    let summary = err.to_string().lines().next().unwrap_or_default().to_string();
    log_event(
        PipelineEvent::new(
            PipelineEventType::ExecutionFailed,
            run_id,
            format!("{}: {}", err.kind(), summary),
        )
        .with_elapsed(elapsed)
        .with_severity(severity),
    );
}

/// `failure` is `None` when the directory was removed (or was already gone).
pub fn workspace_cleanup(run_id: &str, kept: bool, failure: Option<&SortboxError>) {
    let event = match (kept, failure) {
        (true, _) => PipelineEvent::new(
            PipelineEventType::WorkspaceCleanup,
            run_id,
            "workspace kept on disk".to_string(),
        ),
        (false, None) => PipelineEvent::new(
            PipelineEventType::WorkspaceCleanup,
            run_id,
            "workspace removed".to_string(),
        ),
        (false, Some(err)) => PipelineEvent::new(
            PipelineEventType::WorkspaceCleanup,
            run_id,
            format!("workspace removal failed: {}", err),
        )
        .with_severity(Severity::Warning),
    };
    log_event(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_fields() {
        let event = PipelineEvent::new(
            PipelineEventType::CompileFinished,
            "run-1",
            "compiled submission_x".to_string(),
        )
        .with_elapsed(Duration::from_millis(420));

        let json = event.to_json();
        assert_eq!(json["event_type"], "CompileFinished");
        assert_eq!(json["severity"], "Info");
        assert_eq!(json["run_id"], "run-1");
        assert_eq!(json["elapsed_ms"], 420);
    }

    #[test]
    fn test_default_severity() {
        assert_eq!(
            PipelineEventType::ExecutionFailed.default_severity(),
            Severity::Warning
        );
        assert_eq!(
            PipelineEventType::SubmissionReceived.default_severity(),
            Severity::Info
        );
    }
}
