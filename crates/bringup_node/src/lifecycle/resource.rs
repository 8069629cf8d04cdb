use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};
use std::time::Duration;

use bringup_core::error::{CoreError, Domain, ErrorKind, Payload, Result};
use bringup_core::lifecycle::{
    begin, finish, BringUp, GateOutcome, ReadinessGate, State, Transition,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::handle::{CompletionSink, NodeHandle, ReadyNotifier};
use super::LifecycleEvent;
use crate::error::log_core_error;

/// What `await_ready` observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyOutcome {
    Ready,
    /// Bring-up finished and reported a cause.
    Failed(CoreError),
    /// No outcome before the deadline. Lifecycle state is unchanged.
    TimedOut,
    /// `stop()` won the race; readiness is moot.
    TornDownDuringWait,
}

impl ReadyOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadyOutcome::Ready)
    }

    /// `Ok` only for `Ready`; every other outcome becomes its cause.
    pub fn into_result(self) -> Result<()> {
        match self {
            ReadyOutcome::Ready => Ok(()),
            ReadyOutcome::Failed(cause) => Err(cause),
            ReadyOutcome::TimedOut => Err(CoreError::ready_timeout()),
            ReadyOutcome::TornDownDuringWait => Err(CoreError::torn_down()),
        }
    }
}

struct Inner<H> {
    state: State,
    // None while `start()` is calling into the handle, and after release.
    handle: Option<H>,
    // Set while `start()` holds the handle outside the lock.
    handle_lent: bool,
}

struct Shared<H> {
    name: String,
    inner: Mutex<Inner<H>>,
    // Signalled when `start()` puts the handle back.
    handle_returned: Condvar,
    gate: ReadinessGate,
    events: broadcast::Sender<LifecycleEvent>,
}

impl<H> Shared<H> {
    fn lock(&self) -> MutexGuard<'_, Inner<H>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poison) => {
                warn!(node = %self.name, "lifecycle state mutex poisoned");
                poison.into_inner()
            }
        }
    }

    /// Block until `start()` is no longer holding the handle.
    fn wait_for_handle<'a>(&self, mut inner: MutexGuard<'a, Inner<H>>) -> MutexGuard<'a, Inner<H>> {
        while inner.handle_lent {
            inner = match self.handle_returned.wait(inner) {
                Ok(guard) => guard,
                Err(poison) => {
                    warn!(node = %self.name, "lifecycle state mutex poisoned");
                    poison.into_inner()
                }
            };
        }
        inner
    }

    /// Apply `to` and publish it. Called with the state lock held so events
    /// come out in transition order.
    fn set_state(&self, inner: &mut Inner<H>, to: State) {
        let from = inner.state;
        inner.state = to;
        // No receivers is fine; transitions never wait on subscribers.
        let _ = self.events.send(LifecycleEvent {
            node: self.name.clone(),
            from,
            to,
        });
    }
}

impl<H: NodeHandle> CompletionSink for Shared<H> {
    fn complete(&self, result: Result<()>) {
        let bring_up = match result {
            Ok(()) => BringUp::Success,
            Err(_) => BringUp::Failure,
        };

        let mut inner = self.lock();
        match inner.state {
            State::Starting => {}
            State::Terminated => {
                debug!(node = %self.name, ?bring_up, "bring-up finished after teardown, ignored");
                return;
            }
            state if state.is_settled() => {
                debug!(node = %self.name, %state, ?bring_up, "duplicate readiness report ignored");
                return;
            }
            state => {
                debug!(node = %self.name, %state, ?bring_up, "readiness report before start ignored");
                return;
            }
        }

        let to = match finish(inner.state, bring_up) {
            Ok(to) => to,
            Err(err) => {
                log_core_error(err);
                return;
            }
        };
        self.set_state(&mut inner, to);
        drop(inner);

        // State is published before the gate opens.
        match result {
            Ok(()) => {
                info!(node = %self.name, "node is ready");
                self.gate.fire_ready();
            }
            Err(cause) => {
                warn!(node = %self.name, %cause, "node bring-up failed");
                self.gate.fire_failed(cause);
            }
        }
    }
}

/// Owns an opaque node handle and its readiness gate.
///
/// Lifecycle:
/// - `start()` only from `Uninitialized`; bring-up continues in the background
/// - `await_ready()` blocks on the gate, then re-checks for a racing `stop()`
/// - `stop()` from anywhere; the handle is killed exactly once
///
/// Dropping the resource stops it.
pub struct ManagedResource<H: NodeHandle> {
    shared: Arc<Shared<H>>,
}

impl<H: NodeHandle> ManagedResource<H> {
    pub fn new(name: impl Into<String>, handle: H) -> Self {
        let (events, _rx) = broadcast::channel(32);
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                inner: Mutex::new(Inner {
                    state: State::Uninitialized,
                    handle: Some(handle),
                    handle_lent: false,
                }),
                handle_returned: Condvar::new(),
                gate: ReadinessGate::new(),
                events,
            }),
        }
    }

    /// Node name (for logging/introspection).
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> State {
        self.shared.lock().state
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.shared.gate
    }

    /// Subscribe to lifecycle events emitted from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.shared.events.subscribe()
    }

    /// Begin bring-up. Returns once the handle has been asked to start.
    ///
    /// Fails with `ErrorKind::InvalidState` outside `Uninitialized`; nothing
    /// happens in that case and the gate is untouched. A synchronous error from
    /// the handle is not returned here: it becomes the bring-up failure cause
    /// reported by `await_ready`.
    pub fn start(&self, config: H::Config) -> Result<()> {
        let mut handle = {
            let mut inner = self.shared.lock();
            let from = inner.state;
            let to = begin(from, Transition::Start)?;
            let handle = inner
                .handle
                .take()
                .ok_or_else(|| CoreError::invalid_state_lifecycle(from.id(), Transition::Start.id()))?;
            inner.handle_lent = true;
            self.shared.set_state(&mut inner, to);
            handle
        };

        info!(node = %self.shared.name, "starting node");
        let started = handle.start(config, self.notifier());

        // A `stop()` that landed meanwhile is parked on `handle_returned` and
        // releases the handle once it is back in the slot.
        {
            let mut inner = self.shared.lock();
            inner.handle = Some(handle);
            inner.handle_lent = false;
        }
        self.shared.handle_returned.notify_all();

        if let Err(cause) = started {
            self.shared.complete(Err(cause));
        }
        Ok(())
    }

    /// Wait up to `timeout` for bring-up to report.
    pub fn await_ready(&self, timeout: Duration) -> ReadyOutcome {
        let outcome = self.shared.gate.wait_timeout(timeout);
        self.resolve(outcome)
    }

    /// Async `await_ready` for callers running on a tokio runtime.
    pub async fn await_ready_async(&self, timeout: Duration) -> ReadyOutcome {
        let outcome = self.shared.gate.wait_async(timeout).await;
        self.resolve(outcome)
    }

    /// Tear down. Idempotent; concurrent callers collapse into one release.
    ///
    /// If `start()` is still inside `NodeHandle::start`, waits for it to
    /// return so the handle is killed before `stop()` returns. Release errors
    /// are logged, never returned: the resource always ends in `Terminated`.
    pub fn stop(&self) {
        {
            let mut inner = self.shared.lock();
            let from = inner.state;
            if let Err(err) = begin(from, Transition::Stop) {
                debug!(node = %self.shared.name, kind = ?err.kind, "stop on terminated resource");
                return;
            }
            self.shared.set_state(&mut inner, State::Terminated);
        }

        // Wake anyone still waiting; no-op if bring-up already reported.
        self.shared.gate.fire_failed(CoreError::torn_down());

        // Only the caller that moved the state to Terminated gets here, so the
        // slot is taken at most once.
        let handle = self.shared.wait_for_handle(self.shared.lock()).handle.take();
        if let Some(handle) = handle {
            release(&self.shared.name, handle);
        }
        info!(node = %self.shared.name, "node terminated");
    }

    /// Run `f` against the node while it is `Ready`.
    ///
    /// Readiness may be reported before `start()` has returned; in that case
    /// this waits for `start()` to put the handle back. The state lock is held
    /// for the duration of `f`; do not call back into this resource from it.
    pub fn with_handle<R>(&self, f: impl FnOnce(&H) -> R) -> Result<R> {
        let inner = self.shared.wait_for_handle(self.shared.lock());
        match (inner.state, inner.handle.as_ref()) {
            (State::Ready, Some(handle)) => Ok(f(handle)),
            (state, _) => Err(CoreError::warn()
                .domain(Domain::Lifecycle)
                .kind(ErrorKind::InvalidState)
                .msgf(format_args!("node handle is only usable while Ready, state is {state}"))
                .build()),
        }
    }

    fn notifier(&self) -> ReadyNotifier {
        let weak: Weak<Shared<H>> = Arc::downgrade(&self.shared);
        let sink: Weak<dyn CompletionSink> = weak;
        ReadyNotifier::new(sink)
    }

    fn resolve(&self, outcome: GateOutcome) -> ReadyOutcome {
        if self.state().is_terminal() {
            return ReadyOutcome::TornDownDuringWait;
        }
        match outcome {
            GateOutcome::Ready => ReadyOutcome::Ready,
            GateOutcome::Failed(cause) => ReadyOutcome::Failed(cause),
            GateOutcome::TimedOut => ReadyOutcome::TimedOut,
        }
    }
}

impl<H: NodeHandle> Drop for ManagedResource<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<H: NodeHandle> fmt::Debug for ManagedResource<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedResource")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .field("gate_fired", &self.shared.gate.is_fired())
            .finish()
    }
}

fn release<H: NodeHandle>(name: &str, mut handle: H) {
    if let Err(err) = handle.kill() {
        log_core_error(release_error(name, err));
    }
}

fn release_error(name: &str, err: CoreError) -> CoreError {
    CoreError::warn()
        .domain(Domain::Resource)
        .kind(ErrorKind::Release)
        .msgf(format_args!("node {name} release failed: {err}"))
        .payload(Payload::Context {
            key: "node",
            value: name.to_string().into(),
        })
        .build()
}
