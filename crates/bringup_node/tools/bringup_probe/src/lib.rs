//! bringup_probe
//!
//! Node-login probe: bring a node up, wait for readiness with a bounded
//! timeout, check its identity, then tear it down.

pub mod config;
pub mod probe;

pub use config::ProbeConfig;
pub use probe::{render_graph, run_probe, ProbeReport};
