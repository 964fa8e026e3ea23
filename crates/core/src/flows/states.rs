use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    Subsidy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubsidyState {
    #[default]
    NoSubsidy,
    SubsidyRequested,
    SubsidyBounded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubsidyEvent {
    /// "Apply subsidy" switched to yes.
    SubsidyAccepted,
    /// A role is known; `cap` is its cap for the battery quantity, bounded by the gross total.
    CapResolved { cap: u64 },
    /// The role was cleared after a cap had been resolved.
    CapLost,
    /// "Apply subsidy" switched back to no.
    SubsidyDeclined,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    ResolveCap,
    ClampSubsidy,
    ResetSubsidy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: SubsidyState,
    pub to: SubsidyState,
    pub event: SubsidyEvent,
    pub actions: Vec<FlowAction>,
}
