use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cpq::catalog::{Catalog, BATTERY_SETS};
use crate::cpq::pricing::{compute_gross_total, DeterministicPricingEngine};
use crate::cpq::selection::{Selection, SelectionEntry};
use crate::cpq::subsidy::{clamp_subsidy, DeterministicSubsidyEngine, SubsidyCapTable};
use crate::cpq::{CpqEvaluation, CpqEvaluationInput, CpqRuntime, DeterministicCpqRuntime};
use crate::domain::customer::Customer;
use crate::domain::role::Role;
use crate::errors::DomainError;
use crate::flows::{FlowAction, FlowEngine, SubsidyEvent, SubsidyFlow, SubsidyState};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
}

/// Finalized quotation handed to the document emitters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationResult {
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: String,
    pub line_items: Vec<LineItem>,
    pub gross_total: u64,
    pub subsidy_applied: u64,
    pub net_total: i64,
}

/// Live bill preview, recomputed from the current state on every change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub line_items: Vec<LineItem>,
    pub gross_total: u64,
    pub battery_quantity: u32,
    pub subsidy_state: SubsidyState,
    /// Role cap for the quoted battery quantity.
    pub applicable_cap: Option<u64>,
    /// Largest subsidy the slider accepts: the role cap bounded by the gross total.
    pub subsidy_limit: Option<u64>,
    pub subsidy_applied: u64,
    pub net_total: i64,
    pub notes: Vec<String>,
}

/// The single mutable aggregate of one quotation session.
///
/// Mutated only through the named operations below. The stored subsidy
/// amount is re-clamped whenever the subsidy limit moves, so it never
/// exceeds the limit of the current selection and role.
#[derive(Clone, Debug)]
pub struct QuoteState {
    customer: Customer,
    role: Option<Role>,
    selection: Selection,
    subsidy_state: SubsidyState,
    /// Slider amount, always within `[0, subsidy_limit]`.
    subsidy_amount: u64,
    cap_table: SubsidyCapTable,
    flow: FlowEngine<SubsidyFlow>,
}

impl Default for QuoteState {
    fn default() -> Self {
        Self::new(Catalog::standard(), SubsidyCapTable::standard())
    }
}

impl QuoteState {
    pub fn new(catalog: Catalog, cap_table: SubsidyCapTable) -> Self {
        let flow = FlowEngine::default();
        Self {
            customer: Customer::default(),
            role: None,
            selection: Selection::new(catalog),
            subsidy_state: flow.initial_state(),
            subsidy_amount: 0,
            cap_table,
            flow,
        }
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn catalog(&self) -> &Catalog {
        self.selection.catalog()
    }

    pub fn subsidy_state(&self) -> SubsidyState {
        self.subsidy_state
    }

    pub fn set_customer(&mut self, customer: Customer) {
        self.customer = customer;
    }

    pub fn set_role(&mut self, role: Option<Role>) -> Result<(), DomainError> {
        self.role = role;
        self.sync_subsidy_flow()
    }

    pub fn toggle_item(&mut self, item: &str, selected: bool) -> Result<(), DomainError> {
        self.selection.toggle_item(item, selected)?;
        self.sync_subsidy_flow()
    }

    pub fn set_quantity(&mut self, item: &str, quantity: u32) -> Result<(), DomainError> {
        self.selection.set_quantity(item, quantity)?;
        self.sync_subsidy_flow()
    }

    /// Switches the "apply subsidy" option. Turning it off resets the amount to zero.
    pub fn request_subsidy(&mut self, requested: bool) -> Result<(), DomainError> {
        let already_requested = self.subsidy_state != SubsidyState::NoSubsidy;
        if requested == already_requested {
            return Ok(());
        }

        let event =
            if requested { SubsidyEvent::SubsidyAccepted } else { SubsidyEvent::SubsidyDeclined };
        self.apply_event(event)
    }

    /// Records the slider value, clamped to the current subsidy limit.
    /// Needs an active subsidy request and a chosen role.
    pub fn set_subsidy(&mut self, amount: i64) -> Result<(), DomainError> {
        match self.subsidy_state {
            SubsidyState::NoSubsidy => Err(DomainError::SubsidyNotRequested),
            SubsidyState::SubsidyRequested => Err(DomainError::UnknownRole),
            SubsidyState::SubsidyBounded => {
                self.subsidy_amount = clamp_subsidy(amount, self.subsidy_limit().unwrap_or(0));
                Ok(())
            }
        }
    }

    pub fn current_selections(&self) -> Vec<SelectionEntry> {
        self.selection.current_selections()
    }

    pub fn battery_quantity(&self) -> u32 {
        self.selection.quantity_of(BATTERY_SETS)
    }

    pub fn evaluate(&self) -> CpqEvaluation {
        let runtime = DeterministicCpqRuntime::new(
            DeterministicPricingEngine,
            DeterministicSubsidyEngine::new(self.cap_table.clone()),
        );
        self.evaluate_with(&runtime)
    }

    pub fn evaluate_with<R>(&self, runtime: &R) -> CpqEvaluation
    where
        R: CpqRuntime,
    {
        let selections = self.selection.current_selections();
        let requested_subsidy =
            (self.subsidy_state != SubsidyState::NoSubsidy).then_some(self.subsidy_amount);

        runtime.evaluate_quote(CpqEvaluationInput {
            selections: &selections,
            battery_quantity: self.battery_quantity(),
            role: self.role,
            requested_subsidy,
        })
    }

    pub fn gross_total(&self) -> u64 {
        self.evaluate().pricing.gross_total
    }

    /// Role cap for the current battery quantity, while a subsidy is requested.
    pub fn applicable_cap(&self) -> Option<u64> {
        self.evaluate().subsidy.cap
    }

    /// Role cap bounded by the gross total, while a subsidy is requested.
    pub fn subsidy_limit(&self) -> Option<u64> {
        self.evaluate().subsidy.effective_cap
    }

    pub fn subsidy_applied(&self) -> u64 {
        self.evaluate().subsidy.applied
    }

    pub fn net_total(&self) -> i64 {
        self.evaluate().subsidy.net_total
    }

    pub fn summary(&self) -> QuoteSummary {
        let evaluation = self.evaluate();
        QuoteSummary {
            line_items: line_items(&self.selection.current_selections()),
            gross_total: evaluation.pricing.gross_total,
            battery_quantity: self.battery_quantity(),
            subsidy_state: self.subsidy_state,
            applicable_cap: evaluation.subsidy.cap,
            subsidy_limit: evaluation.subsidy.effective_cap,
            subsidy_applied: evaluation.subsidy.applied,
            net_total: evaluation.subsidy.net_total,
            notes: evaluation.subsidy.reasons,
        }
    }

    /// Consumes the session and produces the document input.
    pub fn finalize(self) -> Result<QuotationResult, DomainError> {
        if self.selection.is_empty() {
            return Err(DomainError::EmptySelection);
        }
        self.customer.ensure_complete()?;

        let evaluation = self.evaluate();
        let Customer { name, address, phone } = self.customer;

        Ok(QuotationResult {
            customer_name: name.trim().to_owned(),
            customer_address: address.trim().to_owned(),
            customer_phone: phone.trim().to_owned(),
            line_items: line_items(&self.selection.current_selections()),
            gross_total: evaluation.pricing.gross_total,
            subsidy_applied: evaluation.subsidy.applied,
            net_total: evaluation.subsidy.net_total,
        })
    }

    fn sync_subsidy_flow(&mut self) -> Result<(), DomainError> {
        let gross_total = compute_gross_total(&self.selection.current_selections());
        let limit = self
            .cap_table
            .applicable_cap(self.role, self.battery_quantity())
            .ok()
            .map(|cap| cap.min(gross_total));
        let event = match (self.subsidy_state, limit) {
            (SubsidyState::NoSubsidy, _) | (SubsidyState::SubsidyRequested, None) => return Ok(()),
            (_, Some(cap)) => SubsidyEvent::CapResolved { cap },
            (SubsidyState::SubsidyBounded, None) => SubsidyEvent::CapLost,
        };
        self.apply_event(event)
    }

    fn apply_event(&mut self, event: SubsidyEvent) -> Result<(), DomainError> {
        let outcome = self.flow.apply(&self.subsidy_state, &event)?;
        if outcome.from != outcome.to {
            debug!(
                event_name = "quote.subsidy.transition",
                from = ?outcome.from,
                to = ?outcome.to,
                event = ?outcome.event,
                "subsidy flow transition applied"
            );
        }
        self.subsidy_state = outcome.to;
        for action in &outcome.actions {
            match (action, event) {
                (FlowAction::ResetSubsidy, _) => self.subsidy_amount = 0,
                (FlowAction::ClampSubsidy, SubsidyEvent::CapResolved { cap }) => {
                    self.subsidy_amount = self.subsidy_amount.min(cap);
                }
                (FlowAction::ClampSubsidy, _) => {}
                (FlowAction::ResolveCap, _) => self.sync_subsidy_flow()?,
            }
        }
        Ok(())
    }
}

fn line_items(selections: &[SelectionEntry]) -> Vec<LineItem> {
    selections
        .iter()
        .map(|entry| LineItem { name: entry.item.name.clone(), quantity: entry.quantity })
        .collect()
}
