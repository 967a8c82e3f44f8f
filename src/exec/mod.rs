//! Execution control
//!
//! Deadline accounting and supervised child processes.

pub mod deadline;
pub mod process;
