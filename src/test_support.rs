//! Fixtures shared by the unit tests: canned rows, in-memory workbooks and a
//! PDF text reader.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Document, Object};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

use crate::model::employee::required_columns;
use crate::model::table::{CellValue, EmployeeRow};

#[derive(Debug, Clone)]
pub enum Cell {
    Text(&'static str),
    Number(f64),
    Date(u16, u8, u8),
    Blank,
}

/// Values of the reference row, in [`required_columns`] order.
pub fn jane_doe_cells() -> Vec<Cell> {
    let mut cells = vec![
        Cell::Text("E001"),
        Cell::Text("Jane Doe"),
        Cell::Text("Engineer"),
        Cell::Text("2024-01-15"),
        Cell::Text("Active"),
    ];
    cells.extend(std::iter::repeat_n(Cell::Number(10000.0), 6));
    cells.extend(std::iter::repeat_n(Cell::Number(500.0), 6));
    cells.extend([
        Cell::Number(60000.0),
        Cell::Number(3000.0),
        Cell::Number(57000.0),
    ]);
    cells
}

/// The reference row with a different code and name.
pub fn employee_cells(code: &'static str, name: &'static str) -> Vec<Cell> {
    let mut cells = jane_doe_cells();
    cells[0] = Cell::Text(code);
    cells[1] = Cell::Text(name);
    cells
}

pub fn jane_doe_row() -> EmployeeRow {
    let cells = required_columns()
        .into_iter()
        .zip(jane_doe_cells())
        .map(|(col, cell)| {
            let value = match cell {
                Cell::Text(s) => CellValue::Text(s.to_string()),
                Cell::Number(n) => CellValue::Number(n),
                Cell::Date(..) | Cell::Blank => CellValue::Empty,
            };
            (col.to_string(), value)
        })
        .collect::<BTreeMap<_, _>>();

    EmployeeRow {
        row_number: 2,
        employee_code: "E001".to_string(),
        cells,
    }
}

/// An xlsx file with `headers` on row 1 and `rows` below.
pub fn workbook_bytes(headers: &[&str], rows: &[Vec<Cell>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }

    for (r, row) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(r, col, *s).unwrap();
                }
                Cell::Number(n) => {
                    sheet.write_number(r, col, *n).unwrap();
                }
                Cell::Date(y, m, d) => {
                    let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
                    sheet
                        .write_datetime_with_format(r, col, &date, &date_format)
                        .unwrap();
                }
                Cell::Blank => {}
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// A workbook with the full required header and the given rows.
pub fn payroll_workbook(rows: &[Vec<Cell>]) -> Vec<u8> {
    workbook_bytes(&required_columns(), rows)
}

/// Every string shown with `Tj`, page by page.
pub fn page_texts(pdf: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(pdf).unwrap();

    doc.get_pages()
        .values()
        .map(|&page_id| {
            let raw = doc.get_page_content(page_id).unwrap();
            Content::decode(&raw)
                .unwrap()
                .operations
                .into_iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(bytes, _)) => {
                        Some(String::from_utf8_lossy(bytes).into_owned())
                    }
                    _ => None,
                })
                .collect()
        })
        .collect()
}
