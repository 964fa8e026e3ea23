use serde::{Deserialize, Serialize};

/// A purchasable line of the fixed catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Short machine key, used for receipt placeholders (`quantity_<key>`).
    pub key: String,
    /// Display name, unique within the catalog.
    pub name: String,
    pub unit_price: u64,
    /// Smallest quantity accepted once the item is selected on a quotation.
    pub minimum_quantity: u32,
    /// Smallest quantity accepted on a proforma receipt; zero means optional.
    pub receipt_minimum: u32,
}

impl CatalogItem {
    pub fn new(key: &str, name: &str, unit_price: u64) -> Self {
        Self {
            key: key.to_owned(),
            name: name.to_owned(),
            unit_price,
            minimum_quantity: 1,
            receipt_minimum: 0,
        }
    }

    pub fn with_minimum_quantity(mut self, minimum_quantity: u32) -> Self {
        self.minimum_quantity = minimum_quantity;
        self
    }

    pub fn with_receipt_minimum(mut self, receipt_minimum: u32) -> Self {
        self.receipt_minimum = receipt_minimum;
        self
    }

    /// Matches either the display name or the machine key, ignoring surrounding whitespace.
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        self.name == identifier || self.key == identifier
    }
}
