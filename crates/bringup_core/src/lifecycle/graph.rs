use crate::error::Result;

use super::{available_transitions, begin, finish, BringUp, State, Transition, ALL_STATES};

/// Lifecycle graph derived from the core state/transition tables.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransitionGraph {
    pub states: Vec<State>,
    pub transitions: Vec<TransitionEdge>,
    pub completions: Vec<CompletionEdge>,
}

/// Caller-requested edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransitionEdge {
    pub start: State,
    pub transition: Transition,
    pub goal: State,
}

/// Implicit edge taken when bring-up reports its outcome.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CompletionEdge {
    pub start: State,
    pub result: BringUp,
    pub goal: State,
}

impl TransitionGraph {
    pub fn contains(&self, from: State, to: State) -> bool {
        self.transitions
            .iter()
            .any(|e| e.start == from && e.goal == to)
            || self
                .completions
                .iter()
                .any(|e| e.start == from && e.goal == to)
    }
}

/// Build the canonical lifecycle graph.
pub fn transition_graph() -> Result<TransitionGraph> {
    let mut transitions = Vec::new();
    let mut completions = Vec::new();

    for state in ALL_STATES {
        for transition in available_transitions(state) {
            transitions.push(TransitionEdge {
                start: state,
                transition: *transition,
                goal: begin(state, *transition)?,
            });
        }
        if state == State::Starting {
            for result in [BringUp::Success, BringUp::Failure] {
                completions.push(CompletionEdge {
                    start: state,
                    result,
                    goal: finish(state, result)?,
                });
            }
        }
    }

    Ok(TransitionGraph {
        states: ALL_STATES.to_vec(),
        transitions,
        completions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_contains_all_states_and_expected_edges() {
        let graph = transition_graph().unwrap();

        assert_eq!(graph.states.len(), ALL_STATES.len());

        let expected = [
            (State::Uninitialized, Transition::Start, State::Starting),
            (State::Uninitialized, Transition::Stop, State::Terminated),
            (State::Starting, Transition::Stop, State::Terminated),
            (State::Ready, Transition::Stop, State::Terminated),
            (State::Failed, Transition::Stop, State::Terminated),
        ];

        for (start, transition, goal) in expected {
            assert!(
                graph.transitions.iter().any(|edge| {
                    edge.start == start && edge.transition == transition && edge.goal == goal
                }),
                "missing edge {start:?} -> {transition:?} -> {goal:?}"
            );
        }
        assert_eq!(graph.transitions.len(), expected.len());

        assert_eq!(graph.completions.len(), 2);
        assert!(graph.contains(State::Starting, State::Ready));
        assert!(graph.contains(State::Starting, State::Failed));
        assert!(!graph.contains(State::Terminated, State::Ready));
    }
}
