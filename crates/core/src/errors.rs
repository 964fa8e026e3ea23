use thiserror::Error;

use crate::flows::FlowTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("quantity {quantity} for `{item}` is below the minimum of {minimum}")]
    InvalidQuantity { item: String, quantity: u32, minimum: u32 },
    #[error("`{0}` is not selected")]
    ItemNotSelected(String),
    #[error("unknown catalog item `{0}`")]
    UnknownItem(String),
    #[error("`{0}` is listed more than once")]
    DuplicateItem(String),
    #[error("a role must be chosen before a subsidy can be applied")]
    UnknownRole,
    #[error("subsidy has not been requested for this quote")]
    SubsidyNotRequested,
    #[error("no items selected")]
    EmptySelection,
    #[error("required customer field `{0}` is blank")]
    MissingCustomerField(&'static str),
    #[error("malformed field `{field}`: {reason}")]
    MalformedContactField { field: &'static str, reason: String },
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
}

impl DomainError {
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedContactField { field, reason: reason.into() }
    }

    /// Form field the error should be reported against, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingCustomerField(field) | Self::MalformedContactField { field, .. } => {
                Some(*field)
            }
            Self::InvalidQuantity { item, .. }
            | Self::ItemNotSelected(item)
            | Self::DuplicateItem(item) => Some(item.as_str()),
            Self::UnknownRole => Some("role"),
            _ => None,
        }
    }

    /// Message shown next to the form so the user can correct the input.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidQuantity { item, minimum, .. } => {
                format!("Quantity for {item} must be at least {minimum}.")
            }
            Self::ItemNotSelected(item) => format!("Select {item} before changing its quantity."),
            Self::UnknownItem(item) => format!("{item} is not part of the catalog."),
            Self::DuplicateItem(item) => format!("Enter the quantity for {item} only once."),
            Self::UnknownRole => {
                "Choose who is filling this form before applying a subsidy.".to_owned()
            }
            Self::SubsidyNotRequested => {
                "Enable the subsidy option before choosing an amount.".to_owned()
            }
            Self::EmptySelection => "Please select items to see the bill.".to_owned(),
            Self::MissingCustomerField(field) => format!("{} is required.", field_label(field)),
            Self::MalformedContactField { field: "receipt_no", .. } => {
                "Receipt Number is required and must be numeric up to 5 digits.".to_owned()
            }
            Self::MalformedContactField { field: "phone", .. } => {
                "Phone Number must be exactly 10 digits.".to_owned()
            }
            Self::MalformedContactField { field, reason } => {
                format!("{} {reason}.", field_label(field))
            }
            Self::FlowTransition(_) => {
                "The subsidy options changed; review them and try again.".to_owned()
            }
        }
    }
}

fn field_label(field: &str) -> &str {
    match field {
        "customer_name" => "Customer Name",
        "customer_address" | "address" => "Address",
        "customer_phone" | "phone" => "Phone Number",
        "receipt_no" => "Receipt Number",
        "email" => "Email",
        "amount_received" => "Amount Received",
        "balance_due" => "Balance Due",
        "reference_id" => "Reference ID",
        "payment_mode" => "Payment Mode",
        other => other,
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("document generation failure: {0}")]
    Document(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, field: Option<String>, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. } => message,
            Self::Internal { .. } => "Error rendering document. Please try again.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.user_message(),
                field: error.field().map(str::to_owned),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Document(message) | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn domain_error_maps_to_bad_request_interface_error() {
        let interface =
            ApplicationError::from(DomainError::EmptySelection).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.user_message(), "Please select items to see the bill.");
    }

    #[test]
    fn malformed_phone_keeps_field_specific_message() {
        let interface = ApplicationError::from(DomainError::malformed("phone", "has 5 digits"))
            .into_interface("req-2");

        match &interface {
            InterfaceError::BadRequest { field, .. } => {
                assert_eq!(field.as_deref(), Some("phone"));
            }
            other => panic!("expected bad request, got {other:?}"),
        }
        assert_eq!(interface.user_message(), "Phone Number must be exactly 10 digits.");
    }

    #[test]
    fn document_error_maps_to_generic_internal_message() {
        let interface = ApplicationError::Document("zip entry word/document.xml missing".to_owned())
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.correlation_id(), "req-3");
        assert_eq!(interface.user_message(), "Error rendering document. Please try again.");
    }

    #[test]
    fn generic_text_fields_use_their_label() {
        let error = DomainError::malformed("email", "must be at most 50 characters");
        assert_eq!(error.user_message(), "Email must be at most 50 characters.");
        assert_eq!(error.field(), Some("email"));
    }
}
