use crate::api::payslip::{
    EmployeeCodesResponse, GeneratePayslip, SelectEmployee, SessionResponse, TablePreviewResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payslip Generator API",
        version = "1.0.0",
        description = r#"
## Payslip Generator

Upload a payroll spreadsheet, pick an employee, and download their salary statement as a PDF.

### 🔹 Workflow
- **Upload** raw `.xlsx` / `.xls` / `.ods` bytes to open a session
- **Preview** the parsed table and the selectable employee codes
- **Select** an employee code (optional)
- **Generate** the payslip; the response is an attachment named `{employee_code}.pdf`

### 📦 Required Columns
`Employee Code`, `Employee Name`, `Designation`, `Date of Joining`, `Employment Status`,
six income columns, six deduction columns, `Gross Pay (Rs.)`, `Deductions (Rs.)` and `Net Pay (Rs.)`.

### ⏱ Sessions
Sessions live in memory and expire after a period of inactivity. Uploading again into a
session replaces its table and clears the selection.

---
Built with **Rust**, **Actix Web**, **calamine**, **lopdf**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::payslip::upload_workbook,
        crate::api::payslip::get_session,
        crate::api::payslip::replace_workbook,
        crate::api::payslip::list_records,
        crate::api::payslip::list_employee_codes,
        crate::api::payslip::select_employee,
        crate::api::payslip::generate,
        crate::api::payslip::close_session
    ),
    components(
        schemas(
            SessionResponse,
            TablePreviewResponse,
            EmployeeCodesResponse,
            SelectEmployee,
            GeneratePayslip
        )
    ),
    tags(
        (name = "Payslip", description = "Spreadsheet upload and payslip generation APIs"),
    )
)]
pub struct ApiDoc;
