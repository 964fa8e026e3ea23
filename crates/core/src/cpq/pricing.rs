use serde::{Deserialize, Serialize};

use crate::cpq::selection::SelectionEntry;

pub const CURRENCY: &str = "INR";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub currency: String,
    pub steps: Vec<PricingTraceStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub gross_total: u64,
    pub trace: PricingTrace,
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, selections: &[SelectionEntry]) -> PricingResult;
}

#[derive(Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, selections: &[SelectionEntry]) -> PricingResult {
        price_selections_with_trace(selections)
    }
}

/// Sum of quantity x unit price. An empty selection prices to zero; callers
/// block document generation for that case.
pub fn compute_gross_total(selections: &[SelectionEntry]) -> u64 {
    selections.iter().map(SelectionEntry::line_total).sum()
}

pub fn price_selections_with_trace(selections: &[SelectionEntry]) -> PricingResult {
    let gross_total = compute_gross_total(selections);

    let mut steps: Vec<PricingTraceStep> = selections
        .iter()
        .map(|entry| PricingTraceStep {
            stage: "line".to_string(),
            detail: format!("{} x {} @ {}", entry.item.name, entry.quantity, entry.item.unit_price),
            amount: entry.line_total(),
        })
        .collect();
    steps.push(PricingTraceStep {
        stage: "gross_total".to_string(),
        detail: "sum(unit_price * quantity)".to_string(),
        amount: gross_total,
    });

    PricingResult {
        gross_total,
        trace: PricingTrace { currency: CURRENCY.to_string(), steps },
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_gross_total, price_selections_with_trace};
    use crate::cpq::selection::Selection;

    fn selection(picks: &[(&str, u32)]) -> Selection {
        let mut selection = Selection::default();
        for (item, quantity) in picks {
            selection.toggle_item(item, true).expect("known item");
            selection.set_quantity(item, *quantity).expect("valid quantity");
        }
        selection
    }

    #[test]
    fn gross_total_is_sum_of_line_totals() {
        let picks = selection(&[("12 HP PT Pro incl Dead Weight", 1), ("Battery Sets", 1)]);
        assert_eq!(compute_gross_total(&picks.current_selections()), 168_000);
    }

    #[test]
    fn gross_total_ignores_selection_order() {
        let forward = selection(&[("Seat", 2), ("Fast Chargers", 4), ("Jack", 3)]);
        let backward = selection(&[("Jack", 3), ("Fast Chargers", 4), ("Seat", 2)]);

        let expected = 2 * 6_500 + 4 * 6_500 + 3 * 1_100;
        assert_eq!(compute_gross_total(&forward.current_selections()), expected);
        assert_eq!(compute_gross_total(&backward.current_selections()), expected);
    }

    #[test]
    fn empty_selection_prices_to_zero() {
        assert_eq!(compute_gross_total(&[]), 0);
    }

    #[test]
    fn repeated_pricing_is_identical() {
        let picks = selection(&[("Ginger Kit", 2), ("BuyBack Guarantee", 1)]).current_selections();
        assert_eq!(price_selections_with_trace(&picks), price_selections_with_trace(&picks));
    }

    #[test]
    fn toggling_off_restores_previous_total() {
        let mut picks = selection(&[("12 HP PT Pro incl Dead Weight", 1)]);
        let before = compute_gross_total(&picks.current_selections());

        picks.toggle_item("1 Set of Tyres (5x10)", true).expect("tyres");
        picks.set_quantity("1 Set of Tyres (5x10)", 3).expect("qty");
        assert_eq!(compute_gross_total(&picks.current_selections()), before + 24_000);

        picks.toggle_item("1 Set of Tyres (5x10)", false).expect("untick");
        assert_eq!(compute_gross_total(&picks.current_selections()), before);
    }

    #[test]
    fn trace_records_each_line_and_the_total() {
        let picks = selection(&[("Battery Sets", 2)]).current_selections();
        let result = price_selections_with_trace(&picks);

        assert_eq!(result.gross_total, 112_000);
        assert_eq!(result.trace.currency, "INR");
        assert_eq!(result.trace.steps.len(), 2);
        assert_eq!(result.trace.steps[0].amount, 112_000);
        assert_eq!(result.trace.steps[1].stage, "gross_total");
    }
}
