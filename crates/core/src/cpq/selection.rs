use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cpq::catalog::Catalog;
use crate::domain::product::CatalogItem;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub item: CatalogItem,
    pub quantity: u32,
}

impl SelectionEntry {
    pub fn line_total(&self) -> u64 {
        u64::from(self.quantity) * self.item.unit_price
    }
}

/// Chosen catalog items and their quantities.
///
/// Entries are keyed by catalog position so `current_selections` always
/// comes back in catalog order, whatever order items were ticked in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    catalog: Catalog,
    quantities: BTreeMap<usize, u32>,
}

impl Selection {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog, quantities: BTreeMap::new() }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Marks an item chosen (starting at its minimum quantity) or removes it.
    /// Re-selecting an already chosen item keeps its quantity.
    pub fn toggle_item(&mut self, item: &str, selected: bool) -> Result<(), DomainError> {
        let position = self.catalog.position(item)?;
        if selected {
            let minimum = self.item_at(position).minimum_quantity.max(1);
            self.quantities.entry(position).or_insert(minimum);
        } else {
            self.quantities.remove(&position);
        }
        Ok(())
    }

    /// Rejects quantities below the item minimum and leaves the previous
    /// quantity in place when it does.
    pub fn set_quantity(&mut self, item: &str, quantity: u32) -> Result<(), DomainError> {
        let position = self.catalog.position(item)?;
        let catalog_item = &self.catalog.items()[position];
        let minimum = catalog_item.minimum_quantity.max(1);
        if quantity < minimum {
            return Err(DomainError::InvalidQuantity {
                item: catalog_item.name.clone(),
                quantity,
                minimum,
            });
        }

        match self.quantities.get_mut(&position) {
            Some(current) => {
                *current = quantity;
                Ok(())
            }
            None => Err(DomainError::ItemNotSelected(self.catalog.items()[position].name.clone())),
        }
    }

    pub fn is_selected(&self, item: &str) -> bool {
        self.catalog
            .position(item)
            .map(|position| self.quantities.contains_key(&position))
            .unwrap_or(false)
    }

    /// Selected quantity, or zero when the item is not chosen.
    pub fn quantity_of(&self, item: &str) -> u32 {
        self.catalog
            .position(item)
            .ok()
            .and_then(|position| self.quantities.get(&position).copied())
            .unwrap_or(0)
    }

    pub fn current_selections(&self) -> Vec<SelectionEntry> {
        self.quantities
            .iter()
            .map(|(position, quantity)| SelectionEntry {
                item: self.item_at(*position).clone(),
                quantity: *quantity,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    fn item_at(&self, position: usize) -> &CatalogItem {
        &self.catalog.items()[position]
    }
}
