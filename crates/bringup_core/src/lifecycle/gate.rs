use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::error::CoreError;

/// Upper bound used when a caller asks for a timeout that overflows `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Outcome recorded when the gate fires. Success and failure are exclusive.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Fired {
    Ready,
    Failed(CoreError),
}

/// What a waiter observed.
///
/// `TimedOut` ("never fired") is distinct from `Failed` ("fired with a cause").
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GateOutcome {
    Ready,
    Failed(CoreError),
    TimedOut,
}

impl From<Fired> for GateOutcome {
    fn from(fired: Fired) -> Self {
        match fired {
            Fired::Ready => GateOutcome::Ready,
            Fired::Failed(cause) => GateOutcome::Failed(cause),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    fired: Option<Fired>,
    waiters: usize,
}

/// One-shot readiness gate.
///
/// - `fire()` records the first outcome and releases current and future waiters
/// - later `fire()` calls are ignored and never overwrite the first outcome
/// - `wait()` blocks the thread on a condvar, `wait_async()` parks the task;
///   neither polls
/// - once fired it stays fired
#[derive(Debug)]
pub struct ReadinessGate {
    slot: Mutex<Slot>,
    cv: Condvar,
    notify: Notify,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            cv: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// Record `fired` if nothing was recorded yet.
    ///
    /// Returns `true` only for the call that actually fired the gate.
    pub fn fire(&self, fired: Fired) -> bool {
        let mut slot = self.lock();
        if let Some(first) = &slot.fired {
            debug!(first = ?first, ignored = ?fired, "readiness gate already fired");
            return false;
        }
        slot.fired = Some(fired);
        drop(slot);

        self.cv.notify_all();
        self.notify.notify_waiters();
        true
    }

    pub fn fire_ready(&self) -> bool {
        self.fire(Fired::Ready)
    }

    pub fn fire_failed(&self, cause: CoreError) -> bool {
        self.fire(Fired::Failed(cause))
    }

    pub fn is_fired(&self) -> bool {
        self.lock().fired.is_some()
    }

    /// The recorded outcome, without waiting.
    pub fn outcome(&self) -> Option<Fired> {
        self.lock().fired.clone()
    }

    /// Number of callers currently blocked in `wait`/`wait_async`.
    pub fn waiters(&self) -> usize {
        self.lock().waiters
    }

    /// Block until fired or `deadline` passes.
    pub fn wait(&self, deadline: Instant) -> GateOutcome {
        let mut slot = self.lock();
        slot.waiters += 1;
        if slot.waiters > 1 {
            debug!(waiters = slot.waiters, "readiness gate shared by several waiters");
        }

        let outcome = loop {
            if let Some(fired) = &slot.fired {
                break GateOutcome::from(fired.clone());
            }
            let now = Instant::now();
            if now >= deadline {
                break GateOutcome::TimedOut;
            }
            slot = match self.cv.wait_timeout(slot, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poison) => {
                    warn!("readiness gate mutex poisoned");
                    poison.into_inner().0
                }
            };
        };

        slot.waiters -= 1;
        outcome
    }

    pub fn wait_timeout(&self, timeout: Duration) -> GateOutcome {
        self.wait(deadline_after(timeout))
    }

    /// Task-friendly `wait_timeout`. Dropping the future is safe.
    pub async fn wait_async(&self, timeout: Duration) -> GateOutcome {
        let deadline = tokio::time::Instant::from_std(deadline_after(timeout));
        let _waiter = WaiterGuard::register(self);

        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a fire in between is not lost.
            notified.as_mut().enable();

            if let Some(fired) = self.outcome() {
                return fired.into();
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self
                    .outcome()
                    .map(GateOutcome::from)
                    .unwrap_or(GateOutcome::TimedOut);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poison) => {
                warn!("readiness gate mutex poisoned");
                poison.into_inner()
            }
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

struct WaiterGuard<'a>(&'a ReadinessGate);

impl<'a> WaiterGuard<'a> {
    fn register(gate: &'a ReadinessGate) -> Self {
        gate.lock().waiters += 1;
        Self(gate)
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().waiters -= 1;
    }
}
