use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::PayslipError;
use crate::model::employee::{EMPLOYEE_CODE, required_columns};
use crate::model::table::{CellValue, EmployeeRow, EmployeeTable};
use crate::utils::dates;

/// Parse an uploaded spreadsheet into an [`EmployeeTable`].
///
/// Reads the first worksheet unless `sheet` names another one. Row 1 is the
/// header and must contain every column from [`required_columns`], spelled
/// exactly; extra columns are kept for the preview.
pub fn load_employee_table(bytes: &[u8], sheet: Option<&str>) -> Result<EmployeeTable, PayslipError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| PayslipError::malformed(format!("not a readable spreadsheet: {e}")))?;

    let index = match sheet {
        Some(name) => workbook
            .sheet_names()
            .iter()
            .position(|n| n.as_str() == name)
            .ok_or_else(|| PayslipError::malformed(format!("no worksheet named '{name}'")))?,
        None => 0,
    };

    let range = workbook
        .worksheet_range_at(index)
        .ok_or_else(|| PayslipError::malformed("workbook has no worksheets"))?
        .map_err(|e| PayslipError::malformed(format!("failed to read worksheet: {e}")))?;

    table_from_range(&range)
}

fn table_from_range(range: &Range<Data>) -> Result<EmployeeTable, PayslipError> {
    let mut rows = range.rows();

    let columns: Vec<String> = rows
        .next()
        .ok_or_else(|| PayslipError::malformed("worksheet is empty"))?
        .iter()
        .map(|cell| to_cell(cell).display_text())
        .collect();

    let missing: Vec<&str> = required_columns()
        .into_iter()
        .filter(|required| !columns.iter().any(|c| c == required))
        .collect();
    if !missing.is_empty() {
        return Err(PayslipError::malformed(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    // the range may not start at A1
    let first_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);

    let mut employees = Vec::new();
    for (offset, raw) in rows.enumerate() {
        let row_number = first_row + offset + 1;

        let mut cells = BTreeMap::new();
        for (column, data) in columns.iter().zip(raw.iter()) {
            if column.is_empty() {
                continue;
            }
            cells.entry(column.clone()).or_insert_with(|| to_cell(data));
        }

        if cells.values().all(CellValue::is_empty) {
            continue;
        }

        let employee_code = cells
            .get(EMPLOYEE_CODE)
            .filter(|c| !c.is_empty())
            .map(CellValue::display_text)
            .ok_or_else(|| {
                PayslipError::malformed(format!("row {row_number} has no {EMPLOYEE_CODE}"))
            })?;

        employees.push(EmployeeRow {
            row_number,
            employee_code,
            cells,
        });
    }

    debug!(
        columns = columns.len(),
        rows = employees.len(),
        "Parsed employee worksheet"
    );

    EmployeeTable::new(columns, employees)
}

fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.trim().to_string()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dates::from_serial(dt.as_f64())
            .map(CellValue::Timestamp)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| dates::parse_date_text(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
            .map(CellValue::Timestamp)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Cell, employee_cells, jane_doe_cells, payroll_workbook, workbook_bytes};

    #[test]
    fn reference_sheet_loads_one_keyed_row() {
        let table = load_employee_table(&payroll_workbook(&[jane_doe_cells()]), None).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.columns().len(), 20);
        let row = table.find("E001").unwrap();
        assert_eq!(row.row_number, 2);
        assert_eq!(row.field("Employee Name"), Some(&CellValue::Text("Jane Doe".into())));
        assert_eq!(row.field("Net Pay (Rs.)"), Some(&CellValue::Number(57000.0)));
    }

    #[test]
    fn header_only_sheet_is_an_empty_table() {
        let table = load_employee_table(&payroll_workbook(&[]), None).unwrap();
        assert!(table.is_empty());
        assert!(table.employee_codes().is_empty());
    }

    #[test]
    fn garbage_bytes_are_malformed_input() {
        let err = load_employee_table(b"definitely not a workbook", None).unwrap_err();
        assert!(matches!(err, PayslipError::MalformedInput { .. }), "{err:?}");
    }

    #[test]
    fn missing_columns_are_listed() {
        let headers: Vec<&str> = required_columns()
            .into_iter()
            .filter(|c| *c != "ESI (Rs.)" && *c != "Designation")
            .collect();
        let err = load_employee_table(&workbook_bytes(&headers, &[]), None).unwrap_err();
        assert_eq!(
            err,
            PayslipError::malformed("missing required columns: Designation, ESI (Rs.)")
        );
    }

    #[test]
    fn column_names_must_match_verbatim() {
        let mut headers = required_columns();
        headers[0] = "employee code";
        let err = load_employee_table(&workbook_bytes(&headers, &[]), None).unwrap_err();
        assert_eq!(err, PayslipError::malformed("missing required columns: Employee Code"));
    }

    #[test]
    fn duplicate_codes_are_rejected_at_load() {
        let bytes = payroll_workbook(&[
            employee_cells("E001", "Jane Doe"),
            employee_cells("E002", "John Roe"),
            employee_cells("E001", "Janet Doe"),
        ]);
        let err = load_employee_table(&bytes, None).unwrap_err();
        assert_eq!(
            err,
            PayslipError::malformed("duplicate Employee Code 'E001' on rows 2 and 4")
        );
    }

    #[test]
    fn blank_rows_are_skipped_but_codeless_rows_are_not() {
        let blank = vec![Cell::Blank; 20];
        let bytes = payroll_workbook(&[jane_doe_cells(), blank, employee_cells("E002", "John Roe")]);
        let table = load_employee_table(&bytes, None).unwrap();
        assert_eq!(table.employee_codes(), vec!["E001", "E002"]);
        assert_eq!(table.find("E002").unwrap().row_number, 4);

        let mut codeless = jane_doe_cells();
        codeless[0] = Cell::Blank;
        let err = load_employee_table(&payroll_workbook(&[codeless]), None).unwrap_err();
        assert_eq!(err, PayslipError::malformed("row 2 has no Employee Code"));
    }

    #[test]
    fn numeric_codes_and_date_cells_are_normalized() {
        let mut cells = jane_doe_cells();
        cells[0] = Cell::Number(1001.0);
        cells[3] = Cell::Date(2024, 1, 15);
        let table = load_employee_table(&payroll_workbook(&[cells]), None).unwrap();

        let row = table.find("1001").unwrap();
        let joined = dates::to_date("Date of Joining", row.field("Date of Joining")).unwrap();
        assert_eq!(dates::format_joining_date(joined), "15-01-2024");
    }

    #[test]
    fn unknown_sheet_name_is_malformed_input() {
        let bytes = payroll_workbook(&[jane_doe_cells()]);
        assert!(load_employee_table(&bytes, Some("Sheet1")).is_ok());
        assert_eq!(
            load_employee_table(&bytes, Some("March")).unwrap_err(),
            PayslipError::malformed("no worksheet named 'March'")
        );
    }

    #[test]
    fn extra_columns_survive_for_the_preview() {
        let mut headers = required_columns();
        headers.push("Bank Account");
        let mut cells = jane_doe_cells();
        cells.push(Cell::Text("XX-1234"));
        let table = load_employee_table(&workbook_bytes(&headers, &[cells]), None).unwrap();

        assert_eq!(table.columns().last().map(String::as_str), Some("Bank Account"));
        assert_eq!(table.preview()[0]["Bank Account"], serde_json::json!("XX-1234"));
    }
}
