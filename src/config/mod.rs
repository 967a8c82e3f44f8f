//! Configuration and policy
//!
//! Executor configuration, toolchain preset, validation and the shared
//! error taxonomy.

pub mod config;
pub mod presets;
pub mod types;
pub mod validator;

pub use config::ExecutorConfig;
