pub mod engine;
pub mod states;

pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, SubsidyFlow};
pub use states::{FlowAction, FlowType, SubsidyEvent, SubsidyState, TransitionOutcome};
