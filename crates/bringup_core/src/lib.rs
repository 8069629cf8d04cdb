//! bringup_core: transport-agnostic primitives for bringing up long-lived nodes.
//!
//! Design goals:
//! - Pure, testable logic (no node or network deps).
//! - Explicit types; one error type across crate boundaries.
//! - Small, stable public API surface.

pub mod error;

/// Lifecycle tables + one-shot readiness gate.
pub mod lifecycle;
