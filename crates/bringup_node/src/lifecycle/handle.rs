use std::fmt;
use std::sync::Weak;

use bringup_core::error::{CoreError, Result};
use tracing::debug;

/// Opaque long-lived node driven by a `ManagedResource`.
///
/// Contract:
/// - `start()` kicks off bring-up and returns without waiting for it
/// - readiness is reported through the `ReadyNotifier`, from any thread,
///   possibly more than once (only the first report counts)
/// - `kill()` releases the node; the owning resource calls it exactly once
///
/// Neither method is called while the resource's internal lock is held, so an
/// implementation may report readiness synchronously from inside `start()`.
pub trait NodeHandle: Send + 'static {
    type Config: Send;

    fn start(&mut self, config: Self::Config, ready: ReadyNotifier) -> Result<()>;

    fn kill(&mut self) -> Result<()>;
}

/// Receiver side of a readiness report.
pub(crate) trait CompletionSink: Send + Sync {
    fn complete(&self, result: Result<()>);
}

/// Readiness callback handed to `NodeHandle::start`.
///
/// Holds a weak reference: reports arriving after the owning resource was
/// dropped are discarded.
#[derive(Clone)]
pub struct ReadyNotifier {
    sink: Weak<dyn CompletionSink>,
}

impl ReadyNotifier {
    pub(crate) fn new(sink: Weak<dyn CompletionSink>) -> Self {
        Self { sink }
    }

    pub fn ready(&self) {
        self.report(Ok(()));
    }

    pub fn failed(&self, cause: CoreError) {
        self.report(Err(cause));
    }

    pub fn report(&self, result: Result<()>) {
        match self.sink.upgrade() {
            Some(sink) => sink.complete(result),
            None => debug!(?result, "readiness reported after resource was dropped"),
        }
    }

    /// False once the owning resource is gone.
    pub fn is_attached(&self) -> bool {
        self.sink.strong_count() > 0
    }
}

impl fmt::Debug for ReadyNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyNotifier")
            .field("attached", &self.is_attached())
            .finish()
    }
}
