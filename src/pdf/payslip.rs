use super::composer::{Align, CellStyle, DocumentComposer, PageCanvas, PageHook};
use super::fonts::FontStyle;
use crate::error::PayslipError;
use crate::model::employee::EmployeeRecord;
use crate::model::table::EmployeeRow;
use crate::utils::dates::format_joining_date;
use crate::utils::money::format_amount;

const IDENTITY_COL: f32 = 65.0;
const ROW_HEIGHT: f32 = 8.0;
// income label, amount, deduction label, amount
const LEDGER_COLS: [f32; 4] = [70.0, 30.0, 60.0, 30.0];
const NET_PAY_COLS: [f32; 2] = [100.0, 80.0];

const HEADER_LINE_HEIGHT: f32 = 5.0;
const TITLE_HEIGHT: f32 = 10.0;
const GAP_AFTER_HEADER: f32 = 20.0;
const GAP_AFTER_TITLE: f32 = 5.0;
const GAP_AFTER_TABLE: f32 = 10.0;
const GAP_AFTER_TOTALS: f32 = 20.0;
const GAP_AFTER_SIGNATORY: f32 = 20.0;
const GAP_BEFORE_NOTE: f32 = 10.0;

/// Presentation constants of the statement. Defaults reproduce the stock payslip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayslipTemplate {
    pub organization_name: String,
    pub address_lines: Vec<String>,
    /// Shown after "SALARY STATEMENT FOR THE MONTH OF".
    pub period: String,
    pub signer_name: String,
    pub signer_title: String,
    pub contact_note: String,
}

impl Default for PayslipTemplate {
    fn default() -> Self {
        Self {
            organization_name: "SYMBIOSYS TECHNOLOGIES".to_string(),
            address_lines: vec![
                "Plot No 1&2, Hill no-2, IT Park,".to_string(),
                "Rushikonda, Visakhapatnam-45".to_string(),
                "Ph: 2550369, 2595657".to_string(),
            ],
            period: "JANUARY 2024".to_string(),
            signer_name: "Durgaaprasadh,".to_string(),
            signer_title: "H.R Executive".to_string(),
            contact_note: "We request you to verify employment details with our office on \
                           email: hr@symbiosystech.com. (+91-0891-2550369)"
                .to_string(),
        }
    }
}

impl PayslipTemplate {
    /// Same template for another statement period.
    pub fn for_period(&self, period: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            ..self.clone()
        }
    }

    fn title(&self) -> String {
        format!("SALARY STATEMENT FOR THE MONTH OF {}", self.period)
    }

    fn header_hook(&self) -> PageHook {
        let lines: Vec<String> = std::iter::once(self.organization_name.clone())
            .chain(self.address_lines.iter().cloned())
            .collect();

        Box::new(move |c: &mut PageCanvas| {
            c.set_font(FontStyle::Bold, 12.0);
            for line in &lines {
                c.cell(0.0, HEADER_LINE_HEIGHT, line, centered().line_break());
            }
            c.ln(GAP_AFTER_HEADER);
        })
    }
}

fn page_number_footer(c: &mut PageCanvas) {
    c.set_y(-15.0);
    c.set_font(FontStyle::Italic, 8.0);
    let label = format!("Page {}", c.page_no());
    c.cell(0.0, 10.0, &label, centered());
}

fn centered() -> CellStyle {
    CellStyle::plain().align(Align::Center)
}

fn boxed_row(doc: &mut DocumentComposer, cells: &[(f32, &str, Align)]) {
    for &(w, text, align) in cells {
        doc.cell(w, ROW_HEIGHT, text, CellStyle::bordered().align(align));
    }
}

fn three_up(doc: &mut DocumentComposer, texts: [&str; 3]) {
    let cells = texts.map(|t| (IDENTITY_COL, t, Align::Left));
    boxed_row(doc, &cells);
}

/// Lay out the one-page salary statement for `record`.
pub fn render_payslip(
    record: &EmployeeRecord,
    template: &PayslipTemplate,
) -> Result<Vec<u8>, PayslipError> {
    let mut doc = DocumentComposer::new(template.header_hook(), Box::new(page_number_footer));
    doc.add_page();

    doc.set_font(FontStyle::Bold, 12.0);
    doc.cell(0.0, TITLE_HEIGHT, &template.title(), centered().line_break());
    doc.ln(GAP_AFTER_TITLE);

    doc.set_font(FontStyle::Bold, 10.0);
    three_up(&mut doc, ["Employee Code", "Employee Name", "Designation"]);
    doc.newline();
    doc.set_font(FontStyle::Regular, 10.0);
    three_up(
        &mut doc,
        [
            record.employee_code.as_str(),
            record.name.as_str(),
            record.designation.as_str(),
        ],
    );
    doc.ln(GAP_AFTER_TABLE);

    doc.set_font(FontStyle::Bold, 10.0);
    three_up(
        &mut doc,
        ["Date of Joining", "Employment Status", "Statement for the month"],
    );
    doc.newline();
    doc.set_font(FontStyle::Regular, 10.0);
    let joined = format_joining_date(record.date_of_joining);
    // third cell stays blank: reserved for a period label
    three_up(&mut doc, [joined.as_str(), record.employment_status.as_str(), ""]);
    doc.ln(GAP_AFTER_TABLE);

    let [label_w, amount_w, deduction_w, deduction_amount_w] = LEDGER_COLS;
    doc.set_font(FontStyle::Bold, 10.0);
    boxed_row(
        &mut doc,
        &[
            (label_w, "Classified Income", Align::Center),
            (amount_w, "Amount (Rs.)", Align::Center),
            (deduction_w, "Deductions", Align::Center),
            (deduction_amount_w, "Amount (Rs.)", Align::Center),
        ],
    );
    doc.newline();

    doc.set_font(FontStyle::Regular, 10.0);
    for (&(income, earned), &(deduction, withheld)) in
        record.income.iter().zip(record.deductions.iter())
    {
        let (income_label, deduction_label) = (income.label(), deduction.label());
        let (earned, withheld) = (format_amount(earned), format_amount(withheld));
        boxed_row(
            &mut doc,
            &[
                (label_w, income_label.as_str(), Align::Left),
                (amount_w, earned.as_str(), Align::Right),
                (deduction_w, deduction_label.as_str(), Align::Left),
                (deduction_amount_w, withheld.as_str(), Align::Right),
            ],
        );
        doc.newline();
    }
    doc.ln(GAP_AFTER_TABLE);

    doc.set_font(FontStyle::Bold, 10.0);
    let gross = format_amount(record.gross_pay);
    let deducted = format_amount(record.total_deductions);
    boxed_row(
        &mut doc,
        &[
            (label_w, "GROSS PAY", Align::Left),
            (amount_w, gross.as_str(), Align::Right),
            (deduction_w, "DEDUCTIONS", Align::Left),
            (deduction_amount_w, deducted.as_str(), Align::Right),
        ],
    );
    doc.newline();
    let net = format_amount(record.net_pay);
    boxed_row(
        &mut doc,
        &[
            (NET_PAY_COLS[0], "NET PAY", Align::Left),
            (NET_PAY_COLS[1], net.as_str(), Align::Right),
        ],
    );
    doc.ln(GAP_AFTER_TOTALS);

    let line = CellStyle::plain().line_break();
    doc.cell(0.0, ROW_HEIGHT, "AUTHORISED SIGNATORY", line);
    doc.ln(GAP_AFTER_SIGNATORY);
    doc.cell(0.0, ROW_HEIGHT, &template.signer_name, line);
    doc.cell(0.0, ROW_HEIGHT, &template.signer_title, line);
    doc.ln(GAP_BEFORE_NOTE);
    doc.set_font(FontStyle::Italic, 8.0);
    doc.cell(0.0, ROW_HEIGHT, &template.contact_note, line);

    doc.finish()
}

/// Type the row and render it; fails before drawing anything if a field is unusable.
pub fn render_row(row: &EmployeeRow, template: &PayslipTemplate) -> Result<Vec<u8>, PayslipError> {
    let record = EmployeeRecord::try_from(row)?;
    render_payslip(&record, template)
}
