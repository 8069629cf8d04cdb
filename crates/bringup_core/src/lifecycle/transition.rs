/// Caller-requested lifecycle transitions.
///
/// The completion edges out of `Starting` are not requested by callers; they
/// are modeled via `finish(State::Starting, BringUp)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Transition {
    Start,
    Stop,
}

impl Transition {
    pub const fn id(self) -> u8 {
        match self {
            Transition::Start => 1,
            Transition::Stop => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Stop => "stop",
        }
    }
}

/// Outcome reported by a resource's background bring-up.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BringUp {
    Success,
    Failure,
}

impl BringUp {
    /// Ids continue after `Transition` ids so payloads stay unambiguous.
    pub const fn id(self) -> u8 {
        match self {
            BringUp::Success => 10,
            BringUp::Failure => 11,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            BringUp::Success => "bring_up_success",
            BringUp::Failure => "bring_up_failure",
        }
    }
}
