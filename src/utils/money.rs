use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};

use crate::error::PayslipError;
use crate::model::table::CellValue;

/// Printed before every amount on the payslip.
pub const CURRENCY_PREFIX: &str = "Rs.";

/// Unit annotation carried by amount column headers, e.g. `Basic Pay (Rs.)`.
pub const CURRENCY_SUFFIX: &str = "(Rs.)";

/// Coerce the cell under `field` into a decimal amount.
///
/// An absent or blank cell is a [`PayslipError::MissingField`]; it is never read as zero.
pub fn to_amount(field: &str, cell: Option<&CellValue>) -> Result<Decimal, PayslipError> {
    let cell = cell.ok_or_else(|| PayslipError::missing(field))?;

    match cell {
        CellValue::Empty => Err(PayslipError::missing(field)),
        CellValue::Number(n) => {
            Decimal::from_f64(*n).ok_or_else(|| PayslipError::format(field, n.to_string()))
        }
        CellValue::Text(s) => parse_amount(s).ok_or_else(|| PayslipError::format(field, s.trim())),
        other => Err(PayslipError::format(field, other.display_text())),
    }
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// `Rs. 1234.50`: two decimals, rounded half away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{CURRENCY_PREFIX} {rounded:.2}")
}

/// Column header without its currency annotation: `Basic Pay (Rs.)` → `Basic Pay`.
pub fn strip_unit_suffix(column: &str) -> String {
    column.replace(CURRENCY_SUFFIX, "").trim().to_string()
}
