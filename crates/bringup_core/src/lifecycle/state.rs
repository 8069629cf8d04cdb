/// Lifecycle of a managed resource.
///
/// Monotonic: Uninitialized -> Starting -> {Ready | Failed} -> Terminated.
/// `Terminated` is absorbing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum State {
    Uninitialized,
    /// Bring-up requested, completion not yet reported.
    Starting,
    Ready,
    Failed,
    Terminated,
}

/// Internal, compact IDs used for error payloads and events.
impl State {
    pub const fn id(self) -> u8 {
        match self {
            State::Uninitialized => 0,
            State::Starting => 1,
            State::Ready => 2,
            State::Failed => 3,
            State::Terminated => 4,
        }
    }

    /// Position along the monotonic order. `Ready` and `Failed` share a rank.
    pub const fn rank(self) -> u8 {
        match self {
            State::Uninitialized => 0,
            State::Starting => 1,
            State::Ready | State::Failed => 2,
            State::Terminated => 3,
        }
    }

    /// True once bring-up has reported an outcome (or will never report one).
    pub const fn is_settled(self) -> bool {
        matches!(self, State::Ready | State::Failed | State::Terminated)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, State::Terminated)
    }

    /// Stable, human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            State::Uninitialized => "Uninitialized",
            State::Starting => "Starting",
            State::Ready => "Ready",
            State::Failed => "Failed",
            State::Terminated => "Terminated",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical list of all lifecycle states.
pub const ALL_STATES: [State; 5] = [
    State::Uninitialized,
    State::Starting,
    State::Ready,
    State::Failed,
    State::Terminated,
];
