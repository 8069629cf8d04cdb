//! In-process stand-in for a peer-to-peer node.
//!
//! Bring-up runs on a background thread and reports through the
//! `ReadyNotifier` after a configurable delay. `kill()` does not interrupt the
//! delay: a report may arrive after teardown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bringup_core::error::{CoreError, Domain, ErrorKind, Result};

use crate::lifecycle::{NodeHandle, ReadyNotifier};

pub const DEFAULT_USER_ID: &str = "7sRQjDsniyuHdZ9zsQU9DZbMLtQGLBWZ78yHWgjPpTKm";
pub const DEFAULT_BRINGUP_DELAY: Duration = Duration::from_millis(10);

/// How the simulated bring-up ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimBehavior {
    Ready,
    Fail(String),
    /// Never reports; parks until killed.
    Never,
    /// Reports ready twice.
    ReadyTwice,
    /// Reports failure, then ready.
    FailThenReady(String),
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub bringup_delay: Duration,
    pub behavior: SimBehavior,
    pub user_id: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bringup_delay: DEFAULT_BRINGUP_DELAY,
            behavior: SimBehavior::Ready,
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }
}

impl SimConfig {
    pub fn with_behavior(mut self, behavior: SimBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.bringup_delay = delay;
        self
    }
}

/// Counters shared between a `SimulatedNode` and whoever observes it.
#[derive(Debug, Default)]
pub struct SimStats {
    starts: AtomicUsize,
    kills: AtomicUsize,
    reports: AtomicUsize,
}

impl SimStats {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    /// Readiness reports sent, including ones the resource ignored.
    pub fn reports(&self) -> usize {
        self.reports.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct SimulatedNode {
    stats: Arc<SimStats>,
    user_id: Option<String>,
    // Dropping the sender wakes a `Never` bring-up thread.
    park: Option<mpsc::Sender<()>>,
    killed: bool,
}

impl SimulatedNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Arc<SimStats> {
        Arc::clone(&self.stats)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Same as the user id: a single-node identity.
    pub fn node_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

impl NodeHandle for SimulatedNode {
    type Config = SimConfig;

    fn start(&mut self, config: SimConfig, ready: ReadyNotifier) -> Result<()> {
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        if config.user_id.trim().is_empty() {
            return Err(CoreError::error()
                .domain(Domain::Config)
                .kind(ErrorKind::InvalidArgument)
                .msg("user id must not be empty")
                .build());
        }
        self.user_id = Some(config.user_id);

        let (park_tx, park_rx) = mpsc::channel::<()>();
        self.park = Some(park_tx);

        let stats = Arc::clone(&self.stats);
        let report = move |result: Result<()>| {
            stats.reports.fetch_add(1, Ordering::SeqCst);
            ready.report(result);
        };
        let failure = |cause: &str| Err(CoreError::bring_up_failure(cause.to_string()));

        thread::Builder::new()
            .name("sim-node-bringup".into())
            .spawn(move || {
                if config.behavior == SimBehavior::Never {
                    let _ = park_rx.recv();
                    return;
                }
                thread::sleep(config.bringup_delay);
                match &config.behavior {
                    SimBehavior::Ready => report(Ok(())),
                    SimBehavior::Fail(cause) => report(failure(cause.as_str())),
                    SimBehavior::ReadyTwice => {
                        report(Ok(()));
                        report(Ok(()));
                    }
                    SimBehavior::FailThenReady(cause) => {
                        report(failure(cause.as_str()));
                        report(Ok(()));
                    }
                    SimBehavior::Never => {}
                }
            })?;

        Ok(())
    }

    fn kill(&mut self) -> Result<()> {
        self.stats.kills.fetch_add(1, Ordering::SeqCst);
        if self.killed {
            return Err(CoreError::error()
                .domain(Domain::Resource)
                .kind(ErrorKind::Release)
                .msg("simulated node killed twice")
                .build());
        }
        self.killed = true;
        self.park = None;
        Ok(())
    }
}
