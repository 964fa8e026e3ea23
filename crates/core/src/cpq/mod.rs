pub mod catalog;
pub mod pricing;
pub mod selection;
pub mod subsidy;

use serde::{Deserialize, Serialize};

use crate::domain::role::Role;

use self::{
    pricing::{DeterministicPricingEngine, PricingEngine, PricingResult},
    selection::SelectionEntry,
    subsidy::{DeterministicSubsidyEngine, SubsidyDecision, SubsidyEngine, SubsidyInput},
};

#[derive(Clone, Debug)]
pub struct CpqEvaluationInput<'a> {
    pub selections: &'a [SelectionEntry],
    pub battery_quantity: u32,
    pub role: Option<Role>,
    /// `None` when the subsidy option is off.
    pub requested_subsidy: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpqEvaluation {
    pub pricing: PricingResult,
    pub subsidy: SubsidyDecision,
}

pub trait CpqRuntime: Send + Sync {
    fn evaluate_quote(&self, input: CpqEvaluationInput<'_>) -> CpqEvaluation;
}

pub struct DeterministicCpqRuntime<P, S> {
    pricing_engine: P,
    subsidy_engine: S,
}

impl<P, S> DeterministicCpqRuntime<P, S> {
    pub fn new(pricing_engine: P, subsidy_engine: S) -> Self {
        Self { pricing_engine, subsidy_engine }
    }
}

impl Default for DeterministicCpqRuntime<DeterministicPricingEngine, DeterministicSubsidyEngine> {
    fn default() -> Self {
        Self::new(DeterministicPricingEngine, DeterministicSubsidyEngine::default())
    }
}

impl<P, S> CpqRuntime for DeterministicCpqRuntime<P, S>
where
    P: PricingEngine,
    S: SubsidyEngine,
{
    fn evaluate_quote(&self, input: CpqEvaluationInput<'_>) -> CpqEvaluation {
        let pricing = self.pricing_engine.price(input.selections);
        let subsidy = self.subsidy_engine.evaluate(&SubsidyInput {
            role: input.role,
            battery_quantity: input.battery_quantity,
            gross_total: pricing.gross_total,
            requested: input.requested_subsidy,
        });

        CpqEvaluation { pricing, subsidy }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        cpq::{
            pricing::{DeterministicPricingEngine, PricingEngine, PricingResult},
            selection::{Selection, SelectionEntry},
            subsidy::{
                DeterministicSubsidyEngine, SubsidyCapTable, SubsidyCaps, SubsidyDecision,
                SubsidyEngine, SubsidyInput,
            },
            CpqEvaluationInput, CpqRuntime, DeterministicCpqRuntime,
        },
        domain::role::Role,
    };

    #[test]
    fn deterministic_runtime_prices_then_bounds_subsidy() {
        let runtime = DeterministicCpqRuntime::default();
        let selections = selections_fixture();

        let result = runtime.evaluate_quote(CpqEvaluationInput {
            selections: &selections,
            battery_quantity: 1,
            role: Some(Role::Telecaller),
            requested_subsidy: Some(40_000),
        });

        assert_eq!(result.pricing.gross_total, 168_000);
        assert_eq!(result.subsidy.cap, Some(55_000));
        assert_eq!(result.subsidy.applied, 40_000);
        assert_eq!(result.subsidy.net_total, 128_000);
    }

    #[test]
    fn runtime_supports_explicit_engine_interfaces() {
        #[derive(Default)]
        struct FlatPricingEngine;

        impl PricingEngine for FlatPricingEngine {
            fn price(&self, selections: &[SelectionEntry]) -> PricingResult {
                let mut result = crate::cpq::pricing::price_selections_with_trace(selections);
                result.gross_total = 1_000;
                result
            }
        }

        struct GenerousSubsidyEngine;

        impl SubsidyEngine for GenerousSubsidyEngine {
            fn evaluate(&self, input: &SubsidyInput) -> SubsidyDecision {
                crate::cpq::subsidy::evaluate_subsidy(&SubsidyCapTable::standard(), input)
            }
        }

        let runtime = DeterministicCpqRuntime::new(FlatPricingEngine, GenerousSubsidyEngine);
        let selections = selections_fixture();
        let result = runtime.evaluate_quote(CpqEvaluationInput {
            selections: &selections,
            battery_quantity: 1,
            role: Some(Role::CoFounder),
            requested_subsidy: Some(5_000),
        });

        assert_eq!(result.pricing.gross_total, 1_000);
        assert_eq!(result.subsidy.applied, 1_000);
        assert_eq!(result.subsidy.net_total, 0);
    }

    #[test]
    fn explicit_cap_table_is_honoured() {
        let table = SubsidyCapTable::standard();
        assert_eq!(
            table.caps(Role::Manager),
            Some(SubsidyCaps { single_battery: 65_000, multi_battery: 85_000 })
        );

        let runtime = DeterministicCpqRuntime::new(
            DeterministicPricingEngine,
            DeterministicSubsidyEngine::new(table),
        );
        let selections = selections_fixture();
        let result = runtime.evaluate_quote(CpqEvaluationInput {
            selections: &selections,
            battery_quantity: 2,
            role: Some(Role::Manager),
            requested_subsidy: Some(100_000),
        });

        assert_eq!(result.subsidy.cap, Some(85_000));
        assert_eq!(result.subsidy.applied, 85_000);
    }

    fn selections_fixture() -> Vec<SelectionEntry> {
        let mut selection = Selection::default();
        selection.toggle_item("12 HP PT Pro incl Dead Weight", true).expect("pt pro");
        selection.toggle_item("Battery Sets", true).expect("battery");
        selection.current_selections()
    }
}
