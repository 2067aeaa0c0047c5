use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDateTime, Timelike};
use serde_json::{Value, json};

use crate::error::PayslipError;

/// One spreadsheet cell after ingestion, before any field-level typing.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Human-readable form of the cell; integral numbers drop the `.0`.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Timestamp(ts) => {
                if ts.time().num_seconds_from_midnight() == 0 {
                    ts.date().format("%Y-%m-%d").to_string()
                } else {
                    ts.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Empty => Value::Null,
            CellValue::Text(s) => json!(s),
            CellValue::Number(n) => json!(n),
            CellValue::Bool(b) => json!(b),
            CellValue::Timestamp(_) => json!(self.display_text()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A loaded row: raw cells by column header plus its normalized employee code.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRow {
    /// 1-based row number in the source sheet (the header is row 1).
    pub row_number: usize,
    pub employee_code: String,
    pub cells: BTreeMap<String, CellValue>,
}

impl EmployeeRow {
    /// The cell under `column`, treating blank cells as absent.
    pub fn field(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column).filter(|cell| !cell.is_empty())
    }
}

/// Rows of one uploaded sheet, indexed by employee code.
///
/// Codes are unique; [`EmployeeTable::new`] refuses duplicates.
#[derive(Debug, Clone, Default)]
pub struct EmployeeTable {
    columns: Vec<String>,
    rows: Vec<EmployeeRow>,
    index: HashMap<String, usize>,
}

impl EmployeeTable {
    pub fn new(columns: Vec<String>, rows: Vec<EmployeeRow>) -> Result<Self, PayslipError> {
        let mut index = HashMap::with_capacity(rows.len());

        for (pos, row) in rows.iter().enumerate() {
            if let Some(first) = index.insert(row.employee_code.clone(), pos) {
                return Err(PayslipError::malformed(format!(
                    "duplicate Employee Code '{}' on rows {} and {}",
                    row.employee_code, rows[first].row_number, row.row_number
                )));
            }
        }

        Ok(Self {
            columns,
            rows,
            index,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Selectable codes, in sheet order.
    pub fn employee_codes(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.employee_code.as_str()).collect()
    }

    pub fn find(&self, code: &str) -> Option<&EmployeeRow> {
        self.index.get(code.trim()).map(|&pos| &self.rows[pos])
    }

    /// Rows as JSON objects keyed by column, for the table preview.
    pub fn preview(&self) -> Vec<BTreeMap<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|col| {
                        let value = row
                            .cells
                            .get(col)
                            .map(CellValue::to_json)
                            .unwrap_or(Value::Null);
                        (col.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}
