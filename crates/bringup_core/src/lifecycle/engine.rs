use crate::error::{CoreError, Result};

use super::{BringUp, State, Transition};

/// Apply a caller-requested transition.
///
/// This enforces:
/// - `Start` only from `Uninitialized`
/// - `Stop` from every state except `Terminated`
///
/// Rejections are `ErrorKind::InvalidState` with a `LifecycleTransition` payload.
/// Callers that want `Stop` to be idempotent check `is_terminal()` first.
pub fn begin(current: State, via: Transition) -> Result<State> {
    use State::*;
    use Transition::*;

    let next = match (current, via) {
        (Uninitialized, Start) => Starting,
        (s, Stop) if s != Terminated => Terminated,
        _ => {
            return Err(CoreError::invalid_state_lifecycle(current.id(), via.id()));
        }
    };

    Ok(next)
}

/// Apply the implicit completion edge out of `Starting`.
pub fn finish(current: State, result: BringUp) -> Result<State> {
    use BringUp::*;
    use State::*;

    let next = match (current, result) {
        (Starting, Success) => Ready,
        (Starting, Failure) => Failed,
        _ => {
            return Err(CoreError::invalid_transition_lifecycle(
                current.id(),
                result.id(),
            ));
        }
    };

    Ok(next)
}

/// Transitions a caller may request from a given state.
pub fn available_transitions(state: State) -> &'static [Transition] {
    use State::*;
    use Transition::*;

    match state {
        Uninitialized => &[Start, Stop],
        Starting | Ready | Failed => &[Stop],
        Terminated => &[],
    }
}

/// True if `from -> to` is an edge of the lifecycle (requested or implicit).
pub fn is_legal_edge(from: State, to: State) -> bool {
    let requested = available_transitions(from)
        .iter()
        .any(|t| begin(from, *t).map(|s| s == to).unwrap_or(false));
    let implicit = [BringUp::Success, BringUp::Failure]
        .into_iter()
        .any(|r| finish(from, r).map(|s| s == to).unwrap_or(false));
    requested || implicit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Domain, ErrorKind, Payload};
    use crate::lifecycle::ALL_STATES;

    #[test]
    fn second_start_is_invalid_state_with_payload() {
        let e = begin(State::Starting, Transition::Start).unwrap_err();
        assert_eq!(e.kind, ErrorKind::InvalidState);
        assert_eq!(e.domain, Domain::Lifecycle);

        match e.payload {
            Payload::LifecycleTransition {
                from_state,
                via_transition,
            } => {
                assert_eq!(from_state, State::Starting.id());
                assert_eq!(via_transition, Transition::Start.id());
            }
            _ => panic!("expected LifecycleTransition payload"),
        }
    }

    #[test]
    fn start_rejected_everywhere_but_uninitialized() {
        for state in ALL_STATES {
            let r = begin(state, Transition::Start);
            if state == State::Uninitialized {
                assert_eq!(r.unwrap(), State::Starting);
            } else {
                assert!(r.is_err(), "start accepted from {state:?}");
            }
        }
    }

    #[test]
    fn stop_reaches_terminated_from_every_live_state() {
        for state in ALL_STATES {
            let r = begin(state, Transition::Stop);
            if state.is_terminal() {
                assert!(r.is_err());
            } else {
                assert_eq!(r.unwrap(), State::Terminated);
            }
        }
    }

    #[test]
    fn completion_only_leaves_starting() {
        assert_eq!(finish(State::Starting, BringUp::Success).unwrap(), State::Ready);
        assert_eq!(finish(State::Starting, BringUp::Failure).unwrap(), State::Failed);

        let e = finish(State::Terminated, BringUp::Success).unwrap_err();
        assert_eq!(e.kind, ErrorKind::InvalidTransition);
        assert!(finish(State::Ready, BringUp::Failure).is_err());
    }

    #[test]
    fn legal_edges_never_go_backwards() {
        for from in ALL_STATES {
            for to in ALL_STATES {
                if is_legal_edge(from, to) {
                    assert!(to.rank() > from.rank(), "{from:?} -> {to:?}");
                }
            }
        }
        assert!(is_legal_edge(State::Uninitialized, State::Terminated));
        assert!(!is_legal_edge(State::Ready, State::Starting));
        assert!(!is_legal_edge(State::Failed, State::Ready));
    }
}
