use thiserror::Error;

use crate::flows::states::{FlowAction, FlowType, SubsidyEvent, SubsidyState, TransitionOutcome};

pub trait FlowDefinition {
    fn flow_type(&self) -> FlowType;
    fn initial_state(&self) -> SubsidyState;
    fn transition(
        &self,
        current: &SubsidyState,
        event: &SubsidyEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

#[derive(Clone, Debug, Default)]
pub struct SubsidyFlow;

impl FlowDefinition for SubsidyFlow {
    fn flow_type(&self) -> FlowType {
        FlowType::Subsidy
    }

    fn initial_state(&self) -> SubsidyState {
        SubsidyState::NoSubsidy
    }

    fn transition(
        &self,
        current: &SubsidyState,
        event: &SubsidyEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_subsidy(current, event)
    }
}

#[derive(Clone, Debug)]
pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow.flow_type()
    }

    pub fn initial_state(&self) -> SubsidyState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &SubsidyState,
        event: &SubsidyEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event)
    }
}

impl Default for FlowEngine<SubsidyFlow> {
    fn default() -> Self {
        Self::new(SubsidyFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: SubsidyState, event: SubsidyEvent },
}

fn transition_subsidy(
    current: &SubsidyState,
    event: &SubsidyEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{ClampSubsidy, ResetSubsidy, ResolveCap};
    use SubsidyEvent::{CapLost, CapResolved, SubsidyAccepted, SubsidyDeclined};
    use SubsidyState::{NoSubsidy, SubsidyBounded, SubsidyRequested};

    let (to, actions) = match (current, event) {
        (NoSubsidy, SubsidyAccepted) => (SubsidyRequested, vec![ResolveCap]),
        (SubsidyRequested, CapResolved { .. }) | (SubsidyBounded, CapResolved { .. }) => {
            (SubsidyBounded, vec![ClampSubsidy])
        }
        (SubsidyBounded, CapLost) => (SubsidyRequested, vec![ResetSubsidy]),
        (_, SubsidyDeclined) => (NoSubsidy, vec![ResetSubsidy]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition { state: *current, event: *event });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: *event, actions })
}

#[cfg(test)]
mod tests {
    use crate::flows::engine::{FlowDefinition, FlowEngine, FlowTransitionError, SubsidyFlow};
    use crate::flows::states::{FlowAction, FlowType, SubsidyEvent, SubsidyState};

    #[test]
    fn subsidy_flow_happy_path() {
        let engine = FlowEngine::new(SubsidyFlow);
        let mut state = engine.initial_state();
        assert_eq!(state, SubsidyState::NoSubsidy);

        let requested =
            engine.apply(&state, &SubsidyEvent::SubsidyAccepted).expect("none -> requested");
        assert_eq!(requested.to, SubsidyState::SubsidyRequested);
        assert_eq!(requested.actions, vec![FlowAction::ResolveCap]);
        state = requested.to;

        let bounded = engine
            .apply(&state, &SubsidyEvent::CapResolved { cap: 55_000 })
            .expect("requested -> bounded");
        assert_eq!(bounded.to, SubsidyState::SubsidyBounded);
        assert_eq!(bounded.actions, vec![FlowAction::ClampSubsidy]);
    }

    #[test]
    fn cap_changes_keep_the_flow_bounded() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(&SubsidyState::SubsidyBounded, &SubsidyEvent::CapResolved { cap: 75_000 })
            .expect("bounded -> bounded");

        assert_eq!(outcome.to, SubsidyState::SubsidyBounded);
        assert!(outcome.actions.contains(&FlowAction::ClampSubsidy));
    }

    #[test]
    fn declining_resets_from_any_state() {
        let engine = FlowEngine::default();
        for state in [
            SubsidyState::NoSubsidy,
            SubsidyState::SubsidyRequested,
            SubsidyState::SubsidyBounded,
        ] {
            let outcome = engine.apply(&state, &SubsidyEvent::SubsidyDeclined).expect("decline");
            assert_eq!(outcome.to, SubsidyState::NoSubsidy);
            assert_eq!(outcome.actions, vec![FlowAction::ResetSubsidy]);
        }
    }

    #[test]
    fn losing_the_role_returns_to_requested() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(&SubsidyState::SubsidyBounded, &SubsidyEvent::CapLost)
            .expect("bounded -> requested");
        assert_eq!(outcome.to, SubsidyState::SubsidyRequested);
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(&SubsidyState::NoSubsidy, &SubsidyEvent::CapResolved { cap: 55_000 })
            .expect_err("cap without a subsidy request");

        assert!(matches!(
            error,
            FlowTransitionError::InvalidTransition {
                state: SubsidyState::NoSubsidy,
                event: SubsidyEvent::CapResolved { .. }
            }
        ));
        assert!(engine
            .apply(&SubsidyState::SubsidyRequested, &SubsidyEvent::SubsidyAccepted)
            .is_err());
    }

    #[test]
    fn replay_is_deterministic_for_same_event_sequence() {
        let engine = FlowEngine::default();
        let events = [
            SubsidyEvent::SubsidyAccepted,
            SubsidyEvent::CapResolved { cap: 55_000 },
            SubsidyEvent::CapResolved { cap: 75_000 },
            SubsidyEvent::SubsidyDeclined,
        ];

        let run = |engine: &FlowEngine<SubsidyFlow>| {
            let mut state = engine.initial_state();
            let mut actions = Vec::new();
            for event in &events {
                let outcome = engine.apply(&state, event).expect("deterministic run");
                actions.push(outcome.actions);
                state = outcome.to;
            }
            (state, actions)
        };

        assert_eq!(run(&engine), run(&engine));
        assert_eq!(engine.flow_type(), FlowType::Subsidy);
        assert_eq!(SubsidyFlow.flow_type(), FlowType::Subsidy);
    }
}
