//! Lifecycle event types.
//!
//! Every state change of a `ManagedResource` is published as one event, in the
//! order the changes were applied.

use bringup_core::lifecycle::State;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub node: String,
    pub from: State,
    pub to: State,
}
