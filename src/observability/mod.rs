//! Observability
//!
//! Structured audit events for every pipeline stage.

pub mod audit;
