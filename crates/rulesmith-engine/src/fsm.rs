//! The attempt state machine.
//!
//! ```text
//! GENERATE --generated--> EXECUTE --succeeded--> VALIDATE --passed--> PROMOTE
//!     ^                      |                       |
//!     +----- failed ---------+-----------------------+   (budget left)
//!                        any failure, budget spent --> FAIL
//! ```
//!
//! The attempt counter starts at zero and is incremented each time
//! GENERATE is entered, so a budget of `n` allows exactly `n` generation
//! calls.

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Generate,
    Execute,
    Validate,
    /// Terminal success.
    Promote,
    /// Terminal failure.
    Fail,
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Promote | Self::Fail)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Generate => "GENERATE",
            Self::Execute => "EXECUTE",
            Self::Validate => "VALIDATE",
            Self::Promote => "PROMOTE",
            Self::Fail => "FAIL",
        }
    }
}

/// External outcome observed in a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Generated,
    GenerationFailed,
    ExecutionSucceeded,
    ExecutionFailed,
    ValidationPassed,
    ValidationFailed,
}

/// Next state after `event`, given the current attempt number (1-based)
/// and the budget. `None` for an event that cannot occur in `state`.
pub fn transition(state: State, event: Event, attempt: u32, max_attempts: u32) -> Option<State> {
    let retry_or_fail = if attempt < max_attempts {
        State::Generate
    } else {
        State::Fail
    };
    match (state, event) {
        (State::Generate, Event::Generated) => Some(State::Execute),
        (State::Generate, Event::GenerationFailed) => Some(retry_or_fail),
        (State::Execute, Event::ExecutionSucceeded) => Some(State::Validate),
        (State::Execute, Event::ExecutionFailed) => Some(retry_or_fail),
        (State::Validate, Event::ValidationPassed) => Some(State::Promote),
        (State::Validate, Event::ValidationFailed) => Some(retry_or_fail),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut state = State::Generate;
        for event in [Event::Generated, Event::ExecutionSucceeded, Event::ValidationPassed] {
            state = transition(state, event, 1, 3).unwrap();
        }
        assert_eq!(state, State::Promote);
        assert!(state.is_terminal());
    }

    #[test]
    fn failures_retry_until_budget_is_spent() {
        assert_eq!(
            transition(State::Generate, Event::GenerationFailed, 1, 3),
            Some(State::Generate)
        );
        assert_eq!(
            transition(State::Generate, Event::GenerationFailed, 3, 3),
            Some(State::Fail)
        );
        assert_eq!(
            transition(State::Execute, Event::ExecutionFailed, 2, 3),
            Some(State::Generate)
        );
        assert_eq!(
            transition(State::Validate, Event::ValidationFailed, 3, 3),
            Some(State::Fail)
        );
    }

    #[test]
    fn n_failures_mean_n_generations() {
        for max in 1..=5u32 {
            let mut state = State::Generate;
            let mut attempt = 0;
            let mut generations = 0;
            while !state.is_terminal() {
                if state == State::Generate {
                    attempt += 1;
                    generations += 1;
                    state = transition(state, Event::Generated, attempt, max).unwrap();
                } else {
                    state = transition(state, Event::ExecutionFailed, attempt, max).unwrap();
                }
            }
            assert_eq!(state, State::Fail);
            assert_eq!(generations, max);
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        assert_eq!(transition(State::Promote, Event::Generated, 1, 3), None);
        assert_eq!(transition(State::Fail, Event::ValidationPassed, 1, 3), None);
        assert_eq!(transition(State::Generate, Event::ValidationPassed, 1, 3), None);
    }
}
