use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PayslipError;
use crate::model::table::EmployeeTable;
use crate::pdf::payslip::{PayslipTemplate, render_row};

/// One user's working context: the table from their latest upload and the
/// code they picked from it.
///
/// Values are never mutated in place. Selecting or re-uploading yields a new
/// session with the same id, which the store swaps in.
#[derive(Debug, Clone)]
pub struct PayslipSession {
    pub id: Uuid,
    pub source_name: Option<String>,
    pub table: Arc<EmployeeTable>,
    pub selected: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

impl PayslipSession {
    pub fn open(table: EmployeeTable, source_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_name,
            table: Arc::new(table),
            selected: None,
            loaded_at: Utc::now(),
        }
    }

    /// Swap in a freshly uploaded table; the old table and selection are dropped.
    pub fn reload(&self, table: EmployeeTable, source_name: Option<String>) -> Self {
        Self {
            id: self.id,
            source_name,
            table: Arc::new(table),
            selected: None,
            loaded_at: Utc::now(),
        }
    }

    /// Remember `code` as the current choice. Nothing is rendered.
    pub fn select(&self, code: &str) -> Result<Self, PayslipError> {
        let row = self
            .table
            .find(code)
            .ok_or_else(|| PayslipError::LookupFailure {
                code: code.trim().to_string(),
            })?;

        Ok(Self {
            selected: Some(row.employee_code.clone()),
            ..self.clone()
        })
    }

    pub fn employee_codes(&self) -> Vec<&str> {
        self.table.employee_codes()
    }

    /// The code to generate for: an explicit request wins over the stored selection.
    pub fn target_code<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        requested
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .or(self.selected.as_deref())
    }
}

/// A rendered payslip and the name it should be downloaded under.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPayslip {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Look up `code` and render its payslip.
///
/// An unknown code is a [`PayslipError::LookupFailure`] and nothing is rendered.
pub fn generate_payslip(
    table: &EmployeeTable,
    code: &str,
    template: &PayslipTemplate,
) -> Result<GeneratedPayslip, PayslipError> {
    let row = table.find(code).ok_or_else(|| PayslipError::LookupFailure {
        code: code.trim().to_string(),
    })?;

    let bytes = render_row(row, template)?;

    Ok(GeneratedPayslip {
        file_name: payslip_file_name(&row.employee_code),
        bytes,
    })
}

/// `{code}.pdf`, with characters unsafe in a download name replaced by `_`.
pub fn payslip_file_name(code: &str) -> String {
    let stem: String = code
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.pdf")
}
