//! Supervised child processes.
//!
//! Every toolchain run and every launcher run goes through [`run_supervised`]:
//! the child gets its own process group, its pipes are drained by bounded
//! collectors, and the whole group is SIGKILLed when the invocation deadline
//! expires.

use crate::config::types::{Result, SortboxError};
use crate::exec::deadline::Deadline;
use crate::utils::output::{OutputCollector, OutputLimits, OutputResult};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// Extra time the output drains get after the deadline for buffered bytes.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// What a supervised process left behind.
#[derive(Debug)]
pub struct ProcessOutput {
    /// `None` only if the child could not be reaped after a kill
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
    pub output: OutputResult,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.map(|s| s.success()).unwrap_or(false)
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    pub fn term_signal(&self) -> Option<i32> {
        self.status.and_then(|s| s.signal())
    }

    /// Human-readable termination cause, e.g. `exit status 101` or `signal SIGABRT`.
    pub fn termination(&self) -> String {
        if self.timed_out {
            return "killed at deadline".to_string();
        }
        if let Some(code) = self.exit_code() {
            return format!("exit status {}", code);
        }
        match self.term_signal() {
            Some(sig) => match Signal::try_from(sig) {
                Ok(signal) => format!("signal {}", signal.as_str()),
                Err(_) => format!("signal {}", sig),
            },
            None => "unknown termination".to_string(),
        }
    }
}

/// Run `argv` in `workdir` until it exits or `deadline` expires.
pub fn run_supervised(
    argv: &[String],
    workdir: &Path,
    envs: &[(&str, &str)],
    deadline: &Deadline,
    limits: &OutputLimits,
) -> Result<ProcessOutput> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| SortboxError::Config("Empty command provided".to_string()))?;

    if deadline.is_expired() {
        return Err(deadline.timeout_error());
    }

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let started = Instant::now();
    let mut child = cmd
        .spawn()
        .map_err(|e| SortboxError::Toolchain(format!("failed to spawn {}: {}", program, e)))?;
    log::debug!("spawned {} (pid {})", program, child.id());

    let collector = OutputCollector::new(limits.clone());
    let pending = collector.start(child.stdout.take(), child.stderr.take());

    let mut timed_out = false;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                // Stragglers left in the group would hold the pipes open.
                reap_group(&child);
                break Some(status);
            }
            Ok(None) => match deadline.remaining() {
                Some(left) => std::thread::sleep(left.min(POLL_INTERVAL)),
                None => {
                    timed_out = true;
                    break kill_group(&mut child);
                }
            },
            Err(e) => {
                let _ = kill_group(&mut child);
                return Err(SortboxError::Io(e));
            }
        }
    };

    let output = pending.finish(deadline.remaining().unwrap_or_default() + DRAIN_GRACE);
    let wall_time = started.elapsed();
    log::debug!(
        "{} finished after {:?} (timed_out={})",
        program,
        wall_time,
        timed_out
    );

    Ok(ProcessOutput {
        status,
        timed_out,
        output,
    })
}

/// SIGKILL whatever is left in the group of an already reaped child.
fn reap_group(child: &Child) {
    let pgid = Pid::from_raw(child.id() as i32);
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) => log::debug!("killed leftover members of process group {}", pgid),
        Err(Errno::ESRCH) => {}
        Err(e) => log::warn!("killpg({}) failed: {}", pgid, e),
    }
}

/// SIGKILL the child's process group, then reap the child.
fn kill_group(child: &mut Child) -> Option<ExitStatus> {
    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(pgid, Signal::SIGKILL) {
        log::warn!("killpg({}) failed: {}; killing child only", pgid, e);
        let _ = child.kill();
    }
    child.wait().ok()
}
