//! Utility functions and supporting infrastructure.
//!
//! Little-endian block serialization, error types and the blocking worker
//! used by the session orchestrator.

pub mod bytes;
pub mod errors;
pub mod worker;
