use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, Error};
use serde_json::json;

/// Everything a single upload / select / generate action can fail with.
///
/// None of these are fatal to the server: the handler that hit one turns it into
/// a JSON message and the user can re-upload or re-select.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum PayslipError {
    /// The uploaded file is not a readable spreadsheet, or its shape is wrong
    /// (missing columns, empty sheet, rows without or with duplicate codes).
    #[display(fmt = "Malformed input: {}", reason)]
    MalformedInput { reason: String },

    #[display(fmt = "Employee ID not found: {}", code)]
    LookupFailure { code: String },

    #[display(fmt = "Missing field: {}", field)]
    MissingField { field: String },

    #[display(fmt = "Invalid value for {}: {:?}", field, value)]
    FormatError { field: String, value: String },

    #[display(fmt = "Failed to render payslip: {}", reason)]
    Render { reason: String },
}

impl PayslipError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        PayslipError::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        PayslipError::MissingField {
            field: field.into(),
        }
    }

    pub fn format(field: impl Into<String>, value: impl Into<String>) -> Self {
        PayslipError::FormatError {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Short machine-readable tag used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            PayslipError::MalformedInput { .. } => "malformed_input",
            PayslipError::LookupFailure { .. } => "lookup_failure",
            PayslipError::MissingField { .. } => "missing_field",
            PayslipError::FormatError { .. } => "format_error",
            PayslipError::Render { .. } => "render_error",
        }
    }
}

impl ResponseError for PayslipError {
    fn status_code(&self) -> StatusCode {
        match self {
            PayslipError::MalformedInput { .. } => StatusCode::BAD_REQUEST,
            PayslipError::LookupFailure { .. } => StatusCode::NOT_FOUND,
            PayslipError::MissingField { .. } | PayslipError::FormatError { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PayslipError::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}
