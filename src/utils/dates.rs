use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::PayslipError;
use crate::model::table::CellValue;

/// Day zero of the spreadsheet serial-date system (1900 date system, Lotus leap-year bug included).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Largest serial a spreadsheet can hold (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

// Month-first slash dates win over day-first ones, which only apply when the
// first number cannot be a month.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d-%b-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Convert a spreadsheet serial number into a timestamp.
pub fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL + 1.0).contains(&serial) {
        return None;
    }

    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// Parse free-form date text the way a spreadsheet user would type it.
pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

/// Coerce the cell under `field` into a calendar date.
pub fn to_date(field: &str, cell: Option<&CellValue>) -> Result<NaiveDate, PayslipError> {
    let cell = cell.ok_or_else(|| PayslipError::missing(field))?;

    match cell {
        CellValue::Empty => Err(PayslipError::missing(field)),
        CellValue::Timestamp(ts) => Ok(ts.date()),
        CellValue::Number(n) => from_serial(*n)
            .map(|ts| ts.date())
            .ok_or_else(|| PayslipError::format(field, n.to_string())),
        CellValue::Text(s) => parse_date_text(s).ok_or_else(|| PayslipError::format(field, s.trim())),
        CellValue::Bool(b) => Err(PayslipError::format(field, b.to_string())),
    }
}

/// `DD-MM-YYYY`, the only way a date appears on the payslip.
pub fn format_joining_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}
