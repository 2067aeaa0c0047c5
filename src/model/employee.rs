use chrono::NaiveDate;
use rust_decimal::Decimal;
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, IntoStaticStr};

use crate::error::PayslipError;
use crate::model::table::{CellValue, EmployeeRow};
use crate::utils::{dates, money};

pub const EMPLOYEE_CODE: &str = "Employee Code";
pub const EMPLOYEE_NAME: &str = "Employee Name";
pub const DESIGNATION: &str = "Designation";
pub const DATE_OF_JOINING: &str = "Date of Joining";
pub const EMPLOYMENT_STATUS: &str = "Employment Status";

const IDENTITY_COLUMNS: [&str; 5] = [
    EMPLOYEE_CODE,
    EMPLOYEE_NAME,
    DESIGNATION,
    DATE_OF_JOINING,
    EMPLOYMENT_STATUS,
];

/// Classified income, in payslip order. The string form is the column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum IncomeComponent {
    #[strum(serialize = "Basic Pay (Rs.)")]
    BasicPay,
    #[strum(serialize = "House Rent Allowance (Rs.)")]
    HouseRentAllowance,
    #[strum(serialize = "City Compensatory Allowance (Rs.)")]
    CityCompensatoryAllowance,
    #[strum(serialize = "Travel Allowance (Rs.)")]
    TravelAllowance,
    #[strum(serialize = "Food Allowance (Rs.)")]
    FoodAllowance,
    #[strum(serialize = "Performance Incentives (Rs.)")]
    PerformanceIncentives,
}

/// Deductions, in payslip order, paired row by row with [`IncomeComponent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum DeductionComponent {
    #[strum(serialize = "Professional Tax (Rs.)")]
    ProfessionalTax,
    #[strum(serialize = "Income Tax (Rs.)")]
    IncomeTax,
    #[strum(serialize = "Provident Fund (Rs.)")]
    ProvidentFund,
    #[strum(serialize = "ESI (Rs.)")]
    Esi,
    #[strum(serialize = "Leaves-Loss of Pay (Rs.)")]
    LeaveLossOfPay,
    #[strum(serialize = "Others (Rs.)")]
    Others,
}

/// Totals carried as-is from the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum AggregateField {
    #[strum(serialize = "Gross Pay (Rs.)")]
    GrossPay,
    #[strum(serialize = "Deductions (Rs.)")]
    Deductions,
    #[strum(serialize = "Net Pay (Rs.)")]
    NetPay,
}

macro_rules! column_names {
    ($($ty:ty),*) => {
        $(
            impl $ty {
                pub fn column(self) -> &'static str {
                    self.into()
                }
            }
        )*
    };
}

macro_rules! line_item_labels {
    ($($ty:ty),*) => {
        $(
            impl $ty {
                /// Header text without the `(Rs.)` annotation.
                pub fn label(self) -> String {
                    money::strip_unit_suffix(self.column())
                }
            }
        )*
    };
}

column_names!(IncomeComponent, DeductionComponent, AggregateField);
line_item_labels!(IncomeComponent, DeductionComponent);

/// Every header a sheet must carry, in the order they are reported when missing.
pub fn required_columns() -> Vec<&'static str> {
    IDENTITY_COLUMNS
        .into_iter()
        .chain(IncomeComponent::iter().map(IncomeComponent::column))
        .chain(DeductionComponent::iter().map(DeductionComponent::column))
        .chain(AggregateField::iter().map(AggregateField::column))
        .collect()
}

/// A fully typed employee record, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRecord {
    pub employee_code: String,
    pub name: String,
    pub designation: String,
    pub date_of_joining: NaiveDate,
    pub employment_status: String,
    pub income: Vec<(IncomeComponent, Decimal)>,
    pub deductions: Vec<(DeductionComponent, Decimal)>,
    pub gross_pay: Decimal,
    pub total_deductions: Decimal,
    pub net_pay: Decimal,
}

impl TryFrom<&EmployeeRow> for EmployeeRecord {
    type Error = PayslipError;

    fn try_from(row: &EmployeeRow) -> Result<Self, Self::Error> {
        let amount = |column: &str| money::to_amount(column, row.field(column));

        let income = IncomeComponent::iter()
            .map(|c| amount(c.column()).map(|a| (c, a)))
            .collect::<Result<Vec<_>, _>>()?;
        let deductions = DeductionComponent::iter()
            .map(|c| amount(c.column()).map(|a| (c, a)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            employee_code: text(row, EMPLOYEE_CODE)?,
            name: text(row, EMPLOYEE_NAME)?,
            designation: text(row, DESIGNATION)?,
            date_of_joining: dates::to_date(DATE_OF_JOINING, row.field(DATE_OF_JOINING))?,
            employment_status: text(row, EMPLOYMENT_STATUS)?,
            income,
            deductions,
            gross_pay: amount(AggregateField::GrossPay.column())?,
            total_deductions: amount(AggregateField::Deductions.column())?,
            net_pay: amount(AggregateField::NetPay.column())?,
        })
    }
}

fn text(row: &EmployeeRow, column: &str) -> Result<String, PayslipError> {
    row.field(column)
        .map(CellValue::display_text)
        .ok_or_else(|| PayslipError::missing(column))
}
