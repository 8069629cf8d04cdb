//! bringup_node
//!
//! Wrapper layer that owns an opaque node handle and drives it through the
//! `bringup_core` lifecycle: start, wait for readiness, tear down exactly once.

pub mod error;
pub mod lifecycle;
pub mod sim;

// Re-export core types that wrapper users will commonly need
pub use bringup_core::error::{CoreError, Result};
pub use bringup_core::lifecycle::State;
