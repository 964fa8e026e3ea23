use std::collections::HashMap;

use tera::{Tera, Value};

/// Printed before every amount on the quotation.
pub const CURRENCY_LABEL: &str = "Rs";

/// Whole rupees with comma thousands separators: `168000` becomes `168,000`.
pub fn format_rupees(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Registers the filters the document templates rely on.
///
/// - `rupees`: `amount | rupees` prints a whole-rupee amount with separators
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("rupees", tera_rupees_filter);
}

fn tera_rupees_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let amount = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().and_then(|unsigned| i64::try_from(unsigned).ok()))
            .ok_or_else(|| tera::Error::msg("rupees filter expects a whole number"))?,
        Value::Null => 0,
        _ => return Err(tera::Error::msg("rupees filter expects a number")),
    };
    Ok(Value::String(format_rupees(amount)))
}
