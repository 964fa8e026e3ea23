use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cpq::catalog::Catalog;
use crate::cpq::subsidy::SubsidyCapTable;
use crate::domain::customer::Customer;
use crate::domain::quote::QuoteState;
use crate::domain::role::Role;
use crate::errors::DomainError;

/// Quotation form as submitted by the CLI or the HTTP form.
///
/// `items` maps a catalog key or display name to the requested quantity;
/// a quantity of zero leaves the item unselected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteForm {
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: String,
    /// Role label as shown on the form; blank when not chosen.
    pub role: String,
    pub items: BTreeMap<String, u32>,
    pub apply_subsidy: bool,
    pub subsidy_amount: Option<i64>,
}

impl QuoteForm {
    pub fn into_state(self) -> Result<QuoteState, DomainError> {
        self.into_state_with(Catalog::standard(), SubsidyCapTable::standard())
    }

    /// Replays the form into a fresh session through the named mutations.
    pub fn into_state_with(
        self,
        catalog: Catalog,
        cap_table: SubsidyCapTable,
    ) -> Result<QuoteState, DomainError> {
        let mut state = QuoteState::new(catalog, cap_table);
        state.set_customer(Customer::new(
            self.customer_name,
            self.customer_address,
            self.customer_phone,
        ));

        state.catalog().distinct_positions(self.items.keys().map(String::as_str))?;
        for (item, quantity) in self.items.iter().filter(|(_, quantity)| **quantity > 0) {
            state.toggle_item(item, true)?;
            state.set_quantity(item, *quantity)?;
        }

        state.set_role(Role::parse_optional(&self.role)?)?;
        state.request_subsidy(self.apply_subsidy)?;
        if self.apply_subsidy {
            if let Some(amount) = self.subsidy_amount.filter(|amount| *amount != 0) {
                state.set_subsidy(amount)?;
            }
        }

        Ok(state)
    }
}
