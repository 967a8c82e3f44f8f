//! Safety and cleanup
//!
//! Run-scoped scratch namespaces with guaranteed release.

pub mod workspace;
