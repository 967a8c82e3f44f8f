/// Bounded output collection for child processes
///
/// Both pipes are drained on their own thread for the whole lifetime of the
/// child. Bytes beyond the per-stream limit are read and discarded so a chatty
/// callee never blocks on a full pipe. Collection is given up at a caller-set
/// wait, since a descendant that left the process group can keep a pipe open.
use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::process::{ChildStderr, ChildStdout};
use std::thread;
use std::time::{Duration, Instant};

/// Output limits configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLimits {
    /// Combined stdout+stderr limit (bytes)
    pub combined_limit: usize,
    /// Per-stream stdout limit (bytes)
    pub stdout_limit: usize,
    /// Per-stream stderr limit (bytes)
    pub stderr_limit: usize,
}

impl Default for OutputLimits {
    fn default() -> Self {
        OutputLimits {
            combined_limit: 2 * 1024 * 1024, // 2 MB combined
            stdout_limit: 1024 * 1024,       // 1 MB stdout
            stderr_limit: 1024 * 1024,       // 1 MB stderr (rustc diagnostics)
        }
    }
}

/// Integrity of one collected stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputIntegrity {
    Complete,
    TruncatedByLimit,
    ReadError,
    /// The writer end was still open when collection was given up
    StillOpen,
}

impl fmt::Display for OutputIntegrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputIntegrity::Complete => write!(f, "complete"),
            OutputIntegrity::TruncatedByLimit => write!(f, "truncated_by_limit"),
            OutputIntegrity::ReadError => write!(f, "read_error"),
            OutputIntegrity::StillOpen => write!(f, "still_open"),
        }
    }
}

/// Output collection result
#[derive(Debug, Clone)]
pub struct OutputResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_integrity: OutputIntegrity,
    pub stderr_integrity: OutputIntegrity,
}

impl OutputResult {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Suffix for messages built from stderr, empty when nothing was lost.
    pub fn stderr_note(&self) -> String {
        match self.stderr_integrity {
            OutputIntegrity::Complete => String::new(),
            other => format!("\n[stderr {}]", other),
        }
    }
}

type StreamHandle = Receiver<(Vec<u8>, OutputIntegrity)>;

/// Output collector with bounded collection
pub struct OutputCollector {
    limits: OutputLimits,
}

/// Collector threads attached to a running child.
pub struct PendingOutput {
    stdout: Option<StreamHandle>,
    stderr: Option<StreamHandle>,
    combined_limit: usize,
}

impl OutputCollector {
    pub fn new(limits: OutputLimits) -> Self {
        OutputCollector { limits }
    }

    /// Start draining both streams; call [`PendingOutput::finish`] once the child exited.
    pub fn start(&self, stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) -> PendingOutput {
        let stdout_limit = self.limits.stdout_limit;
        let stderr_limit = self.limits.stderr_limit;

        PendingOutput {
            stdout: stdout.map(|s| spawn_collector(s, stdout_limit)),
            stderr: stderr.map(|s| spawn_collector(s, stderr_limit)),
            combined_limit: self.limits.combined_limit,
        }
    }
}

impl PendingOutput {
    /// Wait up to `wait` for both streams to close and apply the combined limit.
    pub fn finish(self, wait: Duration) -> OutputResult {
        let until = Instant::now() + wait;
        let (mut stdout, mut stdout_integrity) = join_stream(self.stdout, until);
        let (mut stderr, mut stderr_integrity) = join_stream(self.stderr, until);

        if stdout.len() + stderr.len() > self.combined_limit {
            // Diagnostics live on stderr, so it keeps priority over stdout.
            if stderr.len() > self.combined_limit {
                stderr.truncate(self.combined_limit);
                stderr_integrity = OutputIntegrity::TruncatedByLimit;
                stdout.clear();
            } else {
                stdout.truncate(self.combined_limit - stderr.len());
            }
            stdout_integrity = OutputIntegrity::TruncatedByLimit;
        }

        OutputResult {
            stdout,
            stderr,
            stdout_integrity,
            stderr_integrity,
        }
    }
}

fn spawn_collector<R: Read + Send + 'static>(stream: R, limit: usize) -> StreamHandle {
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let _ = tx.send(collect_stream(stream, limit));
    });
    rx
}

fn join_stream(handle: Option<StreamHandle>, until: Instant) -> (Vec<u8>, OutputIntegrity) {
    let Some(rx) = handle else {
        return (Vec::new(), OutputIntegrity::Complete);
    };
    match rx.recv_timeout(until.saturating_duration_since(Instant::now())) {
        Ok(collected) => collected,
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("output stream still open after the child exited; abandoning it");
            (Vec::new(), OutputIntegrity::StillOpen)
        }
        Err(RecvTimeoutError::Disconnected) => (Vec::new(), OutputIntegrity::ReadError),
    }
}

/// Collect from a single stream with limit
fn collect_stream<R: Read>(mut stream: R, limit: usize) -> (Vec<u8>, OutputIntegrity) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut integrity = OutputIntegrity::Complete;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let room = limit.saturating_sub(buffer.len());
                if n > room {
                    buffer.extend_from_slice(&chunk[..room]);
                    integrity = OutputIntegrity::TruncatedByLimit;
                } else {
                    buffer.extend_from_slice(&chunk[..n]);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("output stream read failed: {}", e);
                if integrity == OutputIntegrity::Complete {
                    integrity = OutputIntegrity::ReadError;
                }
                break;
            }
        }
    }

    (buffer, integrity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_output_limits_default() {
        let limits = OutputLimits::default();
        assert_eq!(limits.combined_limit, 2 * 1024 * 1024);
        assert_eq!(limits.stdout_limit, 1024 * 1024);
        assert_eq!(limits.stderr_limit, 1024 * 1024);
    }

    #[test]
    fn test_collect_stream_truncates_but_drains() {
        let data = vec![b'x'; 10_000];
        let mut cursor = Cursor::new(data);
        let (buffer, integrity) = collect_stream(&mut cursor, 100);
        assert_eq!(buffer.len(), 100);
        assert_eq!(integrity, OutputIntegrity::TruncatedByLimit);
        assert_eq!(cursor.position(), 10_000);
    }

    #[test]
    fn test_no_streams_is_complete() {
        let collector = OutputCollector::new(OutputLimits::default());
        let result = collector.start(None, None).finish(Duration::ZERO);
        assert!(result.stdout.is_empty());
        assert!(result.stderr.is_empty());
        assert_eq!(result.stdout_integrity, OutputIntegrity::Complete);
        assert_eq!(result.stderr_note(), "");
    }

    #[test]
    fn test_truncated_stderr_is_noted() {
        let result = OutputResult {
            stdout: Vec::new(),
            stderr: b"error[E0308]".to_vec(),
            stdout_integrity: OutputIntegrity::Complete,
            stderr_integrity: OutputIntegrity::TruncatedByLimit,
        };
        assert_eq!(result.stderr_note(), "\n[stderr truncated_by_limit]");
    }

    #[test]
    fn test_finish_gives_up_on_open_pipe() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .unwrap();
        let collector = OutputCollector::new(OutputLimits::default());
        let pending = collector.start(child.stdout.take(), child.stderr.take());

        let started = Instant::now();
        let result = pending.finish(Duration::from_millis(100));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(result.stdout_integrity, OutputIntegrity::StillOpen);
        assert_eq!(result.stderr_integrity, OutputIntegrity::StillOpen);
        assert_eq!(result.stderr_note(), "\n[stderr still_open]");

        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn test_output_integrity_display() {
        assert_eq!(format!("{}", OutputIntegrity::Complete), "complete");
        assert_eq!(format!("{}", OutputIntegrity::TruncatedByLimit), "truncated_by_limit");
        assert_eq!(format!("{}", OutputIntegrity::ReadError), "read_error");
        assert_eq!(format!("{}", OutputIntegrity::StillOpen), "still_open");
    }
}
