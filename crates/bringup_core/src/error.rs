use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Convenient result alias for bringup_core.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Log/handling importance. Maps onto tracing levels in the wrapper layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Where an error came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Domain {
    Lifecycle,
    Gate,
    Resource,
    Config,
    Other,
}

/// Stable error "kind" for matching/branching.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidArgument,
    /// Operation requested from a lifecycle state that forbids it.
    InvalidState,
    /// Internal edge that the lifecycle table does not contain.
    InvalidTransition,
    /// The opaque resource reported that bring-up failed.
    BringUpFailure,
    Timeout,
    /// The resource was stopped before it became ready.
    TornDown,
    /// Releasing the underlying handle failed.
    Release,
    Io,
    Other,
}

/// Optional structured payload for rich context without forcing allocation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Payload {
    None,

    /// Generic key/value context.
    Context {
        key: &'static str,
        value: Cow<'static, str>,
    },

    /// Lifecycle-specific context (compact state/transition ids).
    LifecycleTransition {
        from_state: u8,
        via_transition: u8,
    },
}

/// The one error type that crosses crate boundaries in this workspace.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("{severity:?}: {message}")]
pub struct CoreError {
    pub domain: Domain,
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: Cow<'static, str>,
    pub payload: Payload,
}

impl CoreError {
    pub fn new(
        domain: Domain,
        kind: ErrorKind,
        severity: Severity,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            domain,
            kind,
            severity,
            message: message.into(),
            payload: Payload::None,
        }
    }

    #[inline]
    pub fn debug() -> ErrB {
        ErrB::new(Severity::Debug)
    }
    #[inline]
    pub fn info() -> ErrB {
        ErrB::new(Severity::Info)
    }
    #[inline]
    pub fn warn() -> ErrB {
        ErrB::new(Severity::Warn)
    }
    #[inline]
    pub fn error() -> ErrB {
        ErrB::new(Severity::Error)
    }

    /// A lifecycle operation was requested from a state that rejects it.
    pub fn invalid_state_lifecycle(from_state: u8, via_transition: u8) -> Self {
        CoreError::warn()
            .domain(Domain::Lifecycle)
            .kind(ErrorKind::InvalidState)
            .msg("operation not allowed in current lifecycle state")
            .payload(Payload::LifecycleTransition {
                from_state,
                via_transition,
            })
            .build()
    }

    /// Completion edge requested from a state that has no such edge.
    pub fn invalid_transition_lifecycle(from_state: u8, via_transition: u8) -> Self {
        CoreError::warn()
            .domain(Domain::Lifecycle)
            .kind(ErrorKind::InvalidTransition)
            .msg("invalid lifecycle transition")
            .payload(Payload::LifecycleTransition {
                from_state,
                via_transition,
            })
            .build()
    }

    /// Failure cause reported by a resource's asynchronous bring-up.
    pub fn bring_up_failure(cause: impl Into<Cow<'static, str>>) -> Self {
        CoreError::error()
            .domain(Domain::Resource)
            .kind(ErrorKind::BringUpFailure)
            .msg(cause)
            .build()
    }

    /// Cause recorded on a gate that was released by teardown.
    pub fn torn_down() -> Self {
        CoreError::info()
            .domain(Domain::Lifecycle)
            .kind(ErrorKind::TornDown)
            .msg("resource stopped before it became ready")
            .build()
    }

    /// No readiness outcome was recorded before the caller's deadline.
    pub fn ready_timeout() -> Self {
        CoreError::warn()
            .domain(Domain::Gate)
            .kind(ErrorKind::Timeout)
            .msg("readiness gate did not fire before the deadline")
            .build()
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

/// Fluent builder (takes self, returns Self).
/// Defaults: domain = Other, kind = Other, message = "", payload = None.
#[derive(Debug, Clone)]
pub struct ErrB {
    domain: Domain,
    kind: ErrorKind,
    severity: Severity,
    message: Cow<'static, str>,
    payload: Payload,
}

impl ErrB {
    #[inline]
    fn new(severity: Severity) -> Self {
        Self {
            domain: Domain::Other,
            kind: ErrorKind::Other,
            severity,
            message: Cow::Borrowed(""),
            payload: Payload::None,
        }
    }

    #[inline]
    pub fn domain(mut self, d: Domain) -> Self {
        self.domain = d;
        self
    }

    #[inline]
    pub fn kind(mut self, k: ErrorKind) -> Self {
        self.kind = k;
        self
    }

    #[inline]
    pub fn msg(mut self, m: impl Into<Cow<'static, str>>) -> Self {
        self.message = m.into();
        self
    }

    /// Formatting-friendly message setter.
    #[inline]
    pub fn msgf(mut self, args: fmt::Arguments<'_>) -> Self {
        self.message = Cow::Owned(args.to_string());
        self
    }

    /// Replaces any previous payload.
    #[inline]
    pub fn payload(mut self, p: Payload) -> Self {
        self.payload = p;
        self
    }

    #[inline]
    pub fn build(self) -> CoreError {
        CoreError {
            domain: self.domain,
            kind: self.kind,
            severity: self.severity,
            message: self.message,
            payload: self.payload,
        }
    }
}

impl From<ErrB> for CoreError {
    fn from(b: ErrB) -> Self {
        b.build()
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::error()
            .domain(Domain::Resource)
            .kind(ErrorKind::Io)
            .msg("io error")
            .payload(Payload::Context {
                key: "io",
                value: e.to_string().into(),
            })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_and_overrides() {
        let e = CoreError::warn().msgf(format_args!("node {} busy", 7)).build();
        assert_eq!(e.domain, Domain::Other);
        assert_eq!(e.kind, ErrorKind::Other);
        assert_eq!(e.severity, Severity::Warn);
        assert_eq!(e.message, "node 7 busy");
        assert_eq!(e.to_string(), "Warn: node 7 busy");
    }

    #[test]
    fn ready_timeout_is_a_gate_error() {
        let e = CoreError::ready_timeout();
        assert_eq!(e.domain, Domain::Gate);
        assert!(e.is_kind(ErrorKind::Timeout));
        assert_eq!(e.severity, Severity::Warn);
    }

    #[test]
    fn bring_up_failure_keeps_cause_as_message() {
        let e = CoreError::bring_up_failure("network unreachable");
        assert!(e.is_kind(ErrorKind::BringUpFailure));
        assert_eq!(e.domain, Domain::Resource);
        assert_eq!(e.message, "network unreachable");
    }

    #[test]
    fn io_error_carries_context() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let e: CoreError = io.into();
        assert_eq!(e.kind, ErrorKind::Io);
        match e.payload {
            Payload::Context { key, value } => {
                assert_eq!(key, "io");
                assert!(value.contains("pipe closed"));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
