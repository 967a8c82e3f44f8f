//! Outcome contract
//!
//! The serialisable result handed back to collaborators: either the sorted
//! sequence or a tagged failure.

pub mod verdict;

pub use verdict::{ExecutionOutcome, TestReport};
