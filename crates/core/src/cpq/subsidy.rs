use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::role::Role;
use crate::errors::DomainError;

/// Slider granularity of the subsidy amount on the form.
pub const SUBSIDY_STEP: u64 = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsidyCaps {
    pub single_battery: u64,
    pub multi_battery: u64,
}

impl SubsidyCaps {
    pub fn for_battery_quantity(&self, battery_quantity: u32) -> u64 {
        if battery_quantity <= 1 {
            self.single_battery
        } else {
            self.multi_battery
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubsidyCapTable {
    caps: BTreeMap<Role, SubsidyCaps>,
}

impl SubsidyCapTable {
    pub fn standard() -> Self {
        let caps = [
            (Role::Telecaller, 55_000, 75_000),
            (Role::BusinessDevelopmentOfficer, 60_000, 80_000),
            (Role::Manager, 65_000, 85_000),
            (Role::CoFounder, 100_000, 120_000),
        ]
        .into_iter()
        .map(|(role, single_battery, multi_battery)| {
            (role, SubsidyCaps { single_battery, multi_battery })
        })
        .collect();

        Self { caps }
    }

    pub fn with_caps(mut self, role: Role, caps: SubsidyCaps) -> Self {
        self.caps.insert(role, caps);
        self
    }

    pub fn caps(&self, role: Role) -> Option<SubsidyCaps> {
        self.caps.get(&role).copied()
    }

    /// Cap for a role, choosing the single-battery cap iff at most one battery set is quoted.
    pub fn applicable_cap(
        &self,
        role: Option<Role>,
        battery_quantity: u32,
    ) -> Result<u64, DomainError> {
        let role = role.ok_or(DomainError::UnknownRole)?;
        let caps = self.caps(role).ok_or(DomainError::UnknownRole)?;
        Ok(caps.for_battery_quantity(battery_quantity))
    }
}

impl Default for SubsidyCapTable {
    fn default() -> Self {
        Self::standard()
    }
}

pub fn applicable_cap(role: Option<Role>, battery_quantity: u32) -> Result<u64, DomainError> {
    SubsidyCapTable::standard().applicable_cap(role, battery_quantity)
}

/// Bounds a requested amount to `[0, cap]`. Callers upstream already bound
/// the slider, but the amount is re-clamped here regardless.
pub fn clamp_subsidy(requested: i64, cap: u64) -> u64 {
    u64::try_from(requested.max(0)).unwrap_or(0).min(cap)
}

/// Plain subtraction; no flooring at zero.
pub fn net_price(gross_total: u64, subsidy: u64) -> i64 {
    to_signed(gross_total) - to_signed(subsidy)
}

fn to_signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsidyInput {
    pub role: Option<Role>,
    pub battery_quantity: u32,
    pub gross_total: u64,
    /// `None` when the subsidy option is off.
    pub requested: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsidyDecision {
    pub requested: bool,
    /// Role cap for the current battery quantity, once a role is known.
    pub cap: Option<u64>,
    /// Cap actually enforced: the role cap, further limited to the gross total.
    pub effective_cap: Option<u64>,
    pub applied: u64,
    pub net_total: i64,
    pub reasons: Vec<String>,
}

pub trait SubsidyEngine: Send + Sync {
    fn evaluate(&self, input: &SubsidyInput) -> SubsidyDecision;
}

#[derive(Default)]
pub struct DeterministicSubsidyEngine {
    table: SubsidyCapTable,
}

impl DeterministicSubsidyEngine {
    pub fn new(table: SubsidyCapTable) -> Self {
        Self { table }
    }
}

impl SubsidyEngine for DeterministicSubsidyEngine {
    fn evaluate(&self, input: &SubsidyInput) -> SubsidyDecision {
        evaluate_subsidy(&self.table, input)
    }
}

pub fn evaluate_subsidy(table: &SubsidyCapTable, input: &SubsidyInput) -> SubsidyDecision {
    let mut decision = SubsidyDecision {
        requested: input.requested.is_some(),
        cap: None,
        effective_cap: None,
        applied: 0,
        net_total: net_price(input.gross_total, 0),
        reasons: Vec::new(),
    };

    let Some(requested) = input.requested else {
        return decision;
    };

    let cap = match table.applicable_cap(input.role, input.battery_quantity) {
        Ok(cap) => cap,
        Err(error) => {
            decision.reasons.push(error.to_string());
            return decision;
        }
    };

    let effective_cap = cap.min(input.gross_total);
    if effective_cap < cap {
        decision.reasons.push(format!(
            "subsidy limited to the gross total of {} instead of the role cap of {cap}",
            input.gross_total
        ));
    }

    let applied = clamp_subsidy(to_signed(requested), effective_cap);
    if applied < requested {
        decision.reasons.push(format!("requested subsidy {requested} clamped to {applied}"));
    }

    decision.cap = Some(cap);
    decision.effective_cap = Some(effective_cap);
    decision.applied = applied;
    decision.net_total = net_price(input.gross_total, applied);
    decision
}
