use crate::config::types::{Result, SortboxError};
use std::time::{Duration, Instant};

/// Wall-clock budget shared by every stage of one invocation.
///
/// Started before compilation; child processes are killed once it expires and
/// [`Deadline::check`] turns an overrun into a `Timeout` after the fact.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left, `None` once the budget is spent.
    pub fn remaining(&self) -> Option<Duration> {
        self.limit
            .checked_sub(self.elapsed())
            .filter(|left| !left.is_zero())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_none()
    }

    pub fn timeout_error(&self) -> SortboxError {
        SortboxError::Timeout {
            elapsed_ms: self.elapsed().as_millis() as u64,
            limit_ms: self.limit.as_millis() as u64,
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.elapsed() > self.limit {
            return Err(self.timeout_error());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deadline_has_budget() {
        let deadline = Deadline::start(Duration::from_secs(60));
        assert!(!deadline.is_expired());
        assert!(deadline.remaining().unwrap() <= Duration::from_secs(60));
        assert!(deadline.check().is_ok());
    }

    #[test]
    fn spent_deadline_reports_timeout() {
        let deadline = Deadline::start(Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(20));
        assert!(deadline.is_expired());
        match deadline.check() {
            Err(SortboxError::Timeout { elapsed_ms, limit_ms }) => {
                assert_eq!(limit_ms, 5);
                assert!(elapsed_ms >= 20);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
