use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl Customer {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), address: address.into(), phone: phone.into() }
    }

    /// All three fields are required on the quotation form.
    pub fn ensure_complete(&self) -> Result<(), DomainError> {
        let fields = [
            ("customer_name", &self.name),
            ("customer_address", &self.address),
            ("customer_phone", &self.phone),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(DomainError::MissingCustomerField(field));
            }
        }
        Ok(())
    }
}
