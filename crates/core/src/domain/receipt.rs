use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::cpq::catalog::Catalog;
use crate::errors::DomainError;

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const NOT_AVAILABLE: &str = "N/A";

const RECEIPT_NO_MAX_DIGITS: usize = 5;
const PHONE_DIGITS: usize = 10;
const NAME_MAX_CHARS: usize = 50;
const ADDRESS_MAX_CHARS: usize = 200;
const EMAIL_MAX_CHARS: usize = 50;
const AMOUNT_MAX_CHARS: usize = 10;
const REFERENCE_MAX_CHARS: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    Cashfree,
    Cash,
    /// Free-text mode; blank text prints as "Other".
    Other(String),
}

impl PaymentMode {
    pub fn parse(mode: &str, custom: Option<&str>) -> Result<Self, DomainError> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "cashfree" => Ok(Self::Cashfree),
            "cash" => Ok(Self::Cash),
            "other" => Ok(Self::Other(custom.map(str::trim).unwrap_or_default().to_owned())),
            _ => Err(DomainError::malformed("payment_mode", "must be Cashfree, Cash or Other")),
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cashfree => f.write_str("Cashfree"),
            Self::Cash => f.write_str("Cash"),
            Self::Other(custom) if custom.is_empty() => f.write_str("Other"),
            Self::Other(custom) => f.write_str(custom),
        }
    }
}

/// Raw proforma receipt form, as typed by the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptForm {
    pub receipt_no: String,
    /// Defaults to the generation day when left out.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub amount_received: String,
    #[serde(default = "default_payment_mode")]
    pub payment_mode: String,
    #[serde(default)]
    pub custom_payment_mode: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub balance_due: String,
    #[serde(default)]
    pub tentative_delivery: Option<NaiveDate>,
    /// Quantities keyed by catalog key or name; missing items use their receipt minimum.
    #[serde(default)]
    pub quantities: BTreeMap<String, u32>,
}

fn default_payment_mode() -> String {
    "Cashfree".to_owned()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptQuantity {
    pub key: String,
    pub name: String,
    pub quantity: u32,
}

/// Validated proforma receipt, ready for template binding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProformaReceipt {
    pub receipt_no: String,
    pub date: NaiveDate,
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub amount_received: String,
    pub payment_mode: PaymentMode,
    pub reference_id: Option<String>,
    pub payment_date: NaiveDate,
    pub balance_due: String,
    pub tentative_delivery: NaiveDate,
    pub quantities: Vec<ReceiptQuantity>,
}

impl ReceiptForm {
    /// Validates every field; `today` fills in dates the form left empty.
    pub fn parse(
        self,
        catalog: &Catalog,
        today: NaiveDate,
    ) -> Result<ProformaReceipt, DomainError> {
        let receipt_no = parse_digits("receipt_no", &self.receipt_no, 1..=RECEIPT_NO_MAX_DIGITS)?;
        let phone = parse_digits("phone", &self.phone, PHONE_DIGITS..=PHONE_DIGITS)?;
        let customer_name = bounded_text("customer_name", &self.customer_name, NAME_MAX_CHARS)?;
        let address = bounded_text("address", &self.address, ADDRESS_MAX_CHARS)?;
        let email = optional_text("email", self.email.as_deref(), EMAIL_MAX_CHARS)?;
        let amount_received =
            bounded_text("amount_received", &self.amount_received, AMOUNT_MAX_CHARS)?;
        let payment_mode =
            PaymentMode::parse(&self.payment_mode, self.custom_payment_mode.as_deref())?;
        let reference_id =
            optional_text("reference_id", self.reference_id.as_deref(), REFERENCE_MAX_CHARS)?;
        let balance_due = bounded_text("balance_due", &self.balance_due, AMOUNT_MAX_CHARS)?;
        let quantities = receipt_quantities(catalog, &self.quantities)?;

        Ok(ProformaReceipt {
            receipt_no,
            date: self.date.unwrap_or(today),
            customer_name,
            address,
            phone,
            email,
            amount_received,
            payment_mode,
            reference_id,
            payment_date: self.payment_date.unwrap_or(today),
            balance_due,
            tentative_delivery: self.tentative_delivery.unwrap_or(today),
            quantities,
        })
    }
}

impl ProformaReceipt {
    pub fn output_filename(&self) -> String {
        format!("Orbit_Agritech_Proforma_Receipt_{}.docx", self.receipt_no)
    }

    /// Named bindings for the receipt template.
    pub fn placeholders(&self) -> Map<String, Value> {
        let mut bindings = Map::new();
        let text = [
            ("receipt_no", self.receipt_no.clone()),
            ("date", format_date(self.date)),
            ("customer_name", self.customer_name.clone()),
            ("address_line1", self.address.clone()),
            ("phone", self.phone.clone()),
            ("email", self.email.clone().unwrap_or_else(|| NOT_AVAILABLE.to_owned())),
            ("amount_received", self.amount_received.clone()),
            ("payment_mode", self.payment_mode.to_string()),
            (
                "reference_id",
                self.reference_id.clone().unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
            ),
            ("payment_date", format_date(self.payment_date)),
            ("balance_due", self.balance_due.clone()),
            ("tentative_delivery", format_date(self.tentative_delivery)),
        ];
        for (name, value) in text {
            bindings.insert(name.to_owned(), Value::String(value));
        }
        for line in &self.quantities {
            bindings.insert(format!("quantity_{}", line.key), json!(line.quantity));
        }
        bindings
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Digits-only field. Anything other than ASCII digits is an error rather
/// than being silently dropped.
fn parse_digits(
    field: &'static str,
    raw: &str,
    length: std::ops::RangeInclusive<usize>,
) -> Result<String, DomainError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::malformed(field, "is required"));
    }
    if !value.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(DomainError::malformed(field, "must contain digits only"));
    }
    if !length.contains(&value.len()) {
        let reason = if length.start() == length.end() {
            format!("must be exactly {} digits, got {}", length.start(), value.len())
        } else {
            format!("must be {}-{} digits, got {}", length.start(), length.end(), value.len())
        };
        return Err(DomainError::malformed(field, reason));
    }
    Ok(value.to_owned())
}

fn bounded_text(field: &'static str, raw: &str, max_chars: usize) -> Result<String, DomainError> {
    let value = raw.trim();
    if value.chars().count() > max_chars {
        let reason = format!("must be at most {max_chars} characters");
        return Err(DomainError::malformed(field, reason));
    }
    Ok(value.to_owned())
}

fn optional_text(
    field: &'static str,
    raw: Option<&str>,
    max_chars: usize,
) -> Result<Option<String>, DomainError> {
    let value = bounded_text(field, raw.unwrap_or_default(), max_chars)?;
    Ok((!value.is_empty()).then_some(value))
}

fn receipt_quantities(
    catalog: &Catalog,
    entered: &BTreeMap<String, u32>,
) -> Result<Vec<ReceiptQuantity>, DomainError> {
    let positions = catalog.distinct_positions(entered.keys().map(String::as_str))?;
    let mut quantities: Vec<Option<u32>> = vec![None; catalog.len()];
    for (position, quantity) in positions.into_iter().zip(entered.values()) {
        quantities[position] = Some(*quantity);
    }

    catalog
        .items()
        .iter()
        .zip(quantities)
        .map(|(item, entered)| {
            let quantity = entered.unwrap_or(item.receipt_minimum);
            if quantity < item.receipt_minimum {
                return Err(DomainError::InvalidQuantity {
                    item: item.name.clone(),
                    quantity,
                    minimum: item.receipt_minimum,
                });
            }
            Ok(ReceiptQuantity { key: item.key.clone(), name: item.name.clone(), quantity })
        })
        .collect()
}
