use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bringup_probe::{render_graph, run_probe, ProbeConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ProbeConfig::from_args();

    if config.print_graph {
        print!("{}", render_graph().context("build lifecycle graph")?);
        return Ok(());
    }

    info!(
        "probe started node_name={} timeout_ms={} delay_ms={}",
        config.node_name,
        config.timeout.as_millis(),
        config.bringup_delay.as_millis()
    );

    let report =
        run_probe(&config).with_context(|| format!("probe node {}", config.node_name))?;
    println!("{report}");

    report
        .outcome
        .clone()
        .into_result()
        .with_context(|| format!("node {} did not become ready", report.node_name))?;
    if !report.logged_in() {
        bail!("node {} reported a mismatched identity", report.node_name);
    }
    Ok(())
}
