//! sortbox: compile and run untrusted sorting snippets
//! Takes a Rust source snippet, turns it into a crate, compiles it, finds a
//! sort entry point by shape and calls it once on a caller-supplied input.
//!
//! # Architecture
//!
//! ## Pipeline ([`judge`])
//! - [`judge::wrapper`]: Snippet to compilable unit (verbatim or body-wrapped)
//! - [`judge::compiler`]: rustc invocation producing a per-run rlib
//! - [`judge::loader`]: Compiled unit plus its declared surface
//! - [`judge::resolver`]: Structural entry point matching and selection
//! - [`judge::invoker`]: Generated launcher, one call under the deadline
//! - [`judge::marshal`]: Argument state back to `Vec<i32>`
//! - [`judge::reference`]: Ground-truth collaborator for compile-and-test
//!
//! ## Execution Control ([`exec`])
//! - [`exec::deadline`]: One wall-clock budget per invocation
//! - [`exec::process`]: Supervised child processes, killed at the deadline
//!
//! ## Outcome ([`verdict`])
//! - [`verdict::verdict`]: Tagged success/failure and test reports
//!
//! ## Safety & Cleanup ([`safety`])
//! - [`safety::workspace`]: Run-scoped artifact isolation
//!
//! ## Observability ([`observability`])
//! - [`observability::audit`]: Structured pipeline events
//!
//! ## Configuration ([`config`])
//! - [`config::config`]: Configuration loading
//! - [`config::validator`]: Pre-flight config checks
//! - [`config::types`]: Hints, failure kinds, errors
//! - [`config::presets`]: Rust toolchain preset
//!
//! ## Utilities ([`utils`])
//! - [`utils::output`]: Bounded output collection

// Submission pipeline
pub mod judge;

// Execution Control
pub mod exec;

// Outcome
pub mod verdict;

// Safety & Cleanup
pub mod safety;

// Observability
pub mod observability;

// Configuration
pub mod config;

// Utilities
pub mod utils;

// CLI entrypoint for the sortbox binary.
pub mod cli;

pub use config::types::{AlgorithmHint, FailureKind, Result, SortboxError};
pub use config::ExecutorConfig;
pub use judge::reference::{ReferenceSort, StdSort};
pub use judge::{Judge, Submission};
pub use verdict::{ExecutionOutcome, TestReport};
