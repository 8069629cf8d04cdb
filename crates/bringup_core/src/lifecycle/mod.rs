//! bringup_core::lifecycle
//!
//! Pure lifecycle semantics for a managed, asynchronously started resource.
//! This module contains **no** node or network code.
//!
//! Key ideas:
//! - Requested transitions (`begin`) vs implicit bring-up completion (`finish`)
//! - Monotonic order, `Terminated` absorbs everything
//! - `ReadinessGate` is the one-shot rendezvous between bring-up and its waiter

mod engine;
mod gate;
mod graph;
mod state;
mod transition;

pub use engine::{available_transitions, begin, finish, is_legal_edge};
pub use gate::{Fired, GateOutcome, ReadinessGate};
pub use graph::{transition_graph, CompletionEdge, TransitionEdge, TransitionGraph};
pub use state::{State, ALL_STATES};
pub use transition::{BringUp, Transition};
