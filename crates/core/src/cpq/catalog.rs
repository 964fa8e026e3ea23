use std::collections::BTreeSet;

use crate::domain::product::CatalogItem;
use crate::errors::DomainError;

pub const BATTERY_SETS: &str = "battery";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// The fixed Orbit price list, in display order.
    pub fn standard() -> Self {
        Self::new(vec![
            CatalogItem::new("pt_pro", "12 HP PT Pro incl Dead Weight", 112_000)
                .with_receipt_minimum(1),
            CatalogItem::new(BATTERY_SETS, "Battery Sets", 56_000).with_receipt_minimum(1),
            CatalogItem::new("charger", "Fast Chargers", 6_500)
                .with_minimum_quantity(2)
                .with_receipt_minimum(2),
            CatalogItem::new(
                "blade_weeding",
                "1 Set of Sugarcane Blades(Weeding) including Extended Shaft",
                4_400,
            ),
            CatalogItem::new(
                "blade_earthing",
                "1 Set of Sugarcane Blades(Earthing-up) including Extended Shaft",
                4_400,
            ),
            CatalogItem::new("tyres", "1 Set of Tyres (5x10)", 8_000),
            CatalogItem::new("toolkit", "Toolkit: Spanner, Gloves, Gum Boots", 1_200),
            CatalogItem::new("ginger", "Ginger Kit", 10_000),
            CatalogItem::new("seat", "Seat", 6_500),
            CatalogItem::new("jack", "Jack", 1_100),
            CatalogItem::new("buyback_guarantee", "BuyBack Guarantee", 10_000),
        ])
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, identifier: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.matches(identifier))
    }

    /// Catalog position of an item, accepted by name or key.
    pub fn position(&self, identifier: &str) -> Result<usize, DomainError> {
        self.items
            .iter()
            .position(|item| item.matches(identifier))
            .ok_or_else(|| DomainError::UnknownItem(identifier.trim().to_owned()))
    }

    /// Resolves identifiers to catalog positions. Two identifiers naming the
    /// same item, such as its key and its display name, are rejected.
    pub fn distinct_positions<'a, I>(&self, identifiers: I) -> Result<Vec<usize>, DomainError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = BTreeSet::new();
        identifiers
            .into_iter()
            .map(|identifier| {
                let position = self.position(identifier)?;
                if !seen.insert(position) {
                    return Err(DomainError::DuplicateItem(self.items[position].name.clone()));
                }
                Ok(position)
            })
            .collect()
    }

    pub fn get(&self, position: usize) -> Option<&CatalogItem> {
        self.items.get(position)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
