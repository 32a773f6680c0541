//! # Sprite Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture pools and recording collaborators
//! - Operation scripts replayed against a pool
//! - Determinism harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod script;

/// Re-export proptest for convenience.
pub use proptest;
