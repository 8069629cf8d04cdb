use std::fmt;
use std::time::{Duration, Instant};

use bringup_core::error::Result;
use bringup_core::lifecycle::{transition_graph, State};
use bringup_node::lifecycle::{ManagedResource, ReadyOutcome};
use bringup_node::sim::SimulatedNode;
use tracing::{info, warn};

use crate::config::ProbeConfig;

/// Result of one node-login probe.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub node_name: String,
    pub outcome: ReadyOutcome,
    pub user_id: Option<String>,
    pub node_id: Option<String>,
    pub elapsed: Duration,
    pub final_state: State,
}

impl ProbeReport {
    /// Ready, with a non-empty user id equal to the node id.
    pub fn logged_in(&self) -> bool {
        match (&self.user_id, &self.node_id) {
            (Some(user), Some(node)) => self.outcome.is_ready() && !user.is_empty() && user == node,
            _ => false,
        }
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node={} outcome={:?} user_id={} node_id={} elapsed_ms={} final_state={} logged_in={}",
            self.node_name,
            self.outcome,
            self.user_id.as_deref().unwrap_or("-"),
            self.node_id.as_deref().unwrap_or("-"),
            self.elapsed.as_millis(),
            self.final_state,
            self.logged_in()
        )
    }
}

/// Start a node, wait for readiness, read its identity, and always tear it down.
pub fn run_probe(config: &ProbeConfig) -> Result<ProbeReport> {
    let resource = ManagedResource::new(config.node_name.clone(), SimulatedNode::new());
    let started = Instant::now();

    resource.start(config.sim_config())?;
    let outcome = resource.await_ready(config.timeout);
    let elapsed = started.elapsed();

    let (user_id, node_id) = match &outcome {
        ReadyOutcome::Ready => {
            info!(node = %config.node_name, elapsed_ms = elapsed.as_millis() as u64, "node is ready now");
            resource.with_handle(|node| {
                (
                    node.user_id().map(str::to_owned),
                    node.node_id().map(str::to_owned),
                )
            })?
        }
        ReadyOutcome::Failed(cause) => {
            warn!(node = %config.node_name, %cause, "node start failed, abort probe");
            (None, None)
        }
        ReadyOutcome::TimedOut => {
            warn!(node = %config.node_name, timeout_ms = config.timeout.as_millis() as u64, "node did not become ready");
            (None, None)
        }
        ReadyOutcome::TornDownDuringWait => {
            warn!(node = %config.node_name, "node torn down while waiting");
            (None, None)
        }
    };

    resource.stop();

    Ok(ProbeReport {
        node_name: config.node_name.clone(),
        outcome,
        user_id,
        node_id,
        elapsed,
        final_state: resource.state(),
    })
}

/// Plain-text listing of the lifecycle graph.
pub fn render_graph() -> Result<String> {
    let graph = transition_graph()?;

    let requested = graph
        .transitions
        .iter()
        .map(|edge| format!("{} --{}--> {}\n", edge.start, edge.transition.label(), edge.goal));
    let completions = graph
        .completions
        .iter()
        .map(|edge| format!("{} ..{}..> {}\n", edge.start, edge.result.label(), edge.goal));
    Ok(requested.chain(completions).collect())
}
