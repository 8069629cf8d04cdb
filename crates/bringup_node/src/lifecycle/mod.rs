//! bringup_node::lifecycle
//!
//! Application-facing lifecycle API: the `NodeHandle` collaborator contract and
//! the `ManagedResource` that owns one.

/// Re-export core lifecycle types
pub use bringup_core::lifecycle::{GateOutcome, ReadinessGate, State};

// Opaque node contract + readiness callback.
mod handle;
pub use handle::{NodeHandle, ReadyNotifier};

// Lifecycle transition event stream.
mod events;
pub use events::LifecycleEvent;

// Managed resource: start / await_ready / stop.
mod resource;
pub use resource::{ManagedResource, ReadyOutcome};
