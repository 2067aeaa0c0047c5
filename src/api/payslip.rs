use std::collections::BTreeMap;

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::config::Config;
use crate::controller::{PayslipSession, generate_payslip};
use crate::error::PayslipError;
use crate::utils::session_store::SessionStore;
use crate::utils::workbook::load_employee_table;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Worksheet to read; the first one when omitted.
    #[param(example = "Sheet1")]
    pub sheet: Option<String>,

    #[param(example = "january.xlsx")]
    pub file_name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub session_id: Uuid,

    #[schema(example = "january.xlsx")]
    pub source_name: Option<String>,

    #[schema(example = 42)]
    pub rows: usize,

    pub columns: Vec<String>,

    #[schema(example = "E001")]
    pub selected: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub loaded_at: DateTime<Utc>,
}

impl From<&PayslipSession> for SessionResponse {
    fn from(s: &PayslipSession) -> Self {
        Self {
            session_id: s.id,
            source_name: s.source_name.clone(),
            rows: s.table.len(),
            columns: s.table.columns().to_vec(),
            selected: s.selected.clone(),
            loaded_at: s.loaded_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TablePreviewResponse {
    pub columns: Vec<String>,

    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<BTreeMap<String, Value>>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeCodesResponse {
    #[schema(example = json!(["E001", "E002"]))]
    pub employee_codes: Vec<String>,

    #[schema(example = "E001")]
    pub selected: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectEmployee {
    #[schema(example = "E001")]
    pub employee_code: String,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct GeneratePayslip {
    /// Falls back to the session's selection.
    #[schema(example = "E001")]
    pub employee_code: Option<String>,

    /// Overrides the configured statement period.
    #[schema(example = "FEBRUARY 2024")]
    pub period: Option<String>,
}

fn session_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "message": "Session not found"
    }))
}

/// An empty body asks for the defaults; anything else must be a valid JSON [`GeneratePayslip`].
fn parse_generate_request(req: &HttpRequest, body: &[u8]) -> Result<GeneratePayslip, PayslipError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GeneratePayslip::default());
    }
    if req.content_type() != "application/json" {
        return Err(PayslipError::malformed(format!(
            "payslip request must be application/json, got {:?}",
            req.content_type()
        )));
    }
    serde_json::from_slice(body)
        .map_err(|e| PayslipError::malformed(format!("invalid payslip request: {e}")))
}

fn rejected(session_id: Option<&Uuid>, e: PayslipError) -> PayslipError {
    match &e {
        PayslipError::Render { .. } => {
            error!(session_id = ?session_id, error = %e, "Payslip rendering failed")
        }
        _ => warn!(session_id = ?session_id, error = %e, "Request rejected"),
    }
    e
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    params(UploadQuery),
    request_body(content = String, content_type = "application/octet-stream", description = "Raw .xlsx/.xls/.ods bytes"),
    responses(
        (status = 201, body = SessionResponse),
        (status = 400, description = "Not a readable spreadsheet or required columns missing"),
        (status = 413, description = "Upload too large")
    ),
    tag = "Payslip"
)]
#[instrument(skip_all, fields(file_name = ?query.file_name))]
pub async fn upload_workbook(
    store: web::Data<SessionStore>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> actix_web::Result<HttpResponse> {
    let query = query.into_inner();
    let table = load_employee_table(&body, query.sheet.as_deref()).map_err(|e| rejected(None, e))?;

    let session = store.open(table, query.file_name).await;

    Ok(HttpResponse::Created().json(SessionResponse::from(session.as_ref())))
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, body = SessionResponse),
        (status = 404, description = "Session not found")
    ),
    tag = "Payslip"
)]
pub async fn get_session(
    store: web::Data<SessionStore>,
    path: web::Path<Uuid>,
) -> actix_web::Result<HttpResponse> {
    match store.get(&path.into_inner()).await {
        Some(s) => Ok(HttpResponse::Ok().json(SessionResponse::from(s.as_ref()))),
        None => Ok(session_not_found()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/sessions/{session_id}/workbook",
    params(
        ("session_id" = String, Path, description = "Session ID"),
        UploadQuery
    ),
    request_body(content = String, content_type = "application/octet-stream", description = "Raw .xlsx/.xls/.ods bytes"),
    responses(
        (status = 200, body = SessionResponse),
        (status = 400, description = "Not a readable spreadsheet or required columns missing"),
        (status = 404, description = "Session not found")
    ),
    tag = "Payslip"
)]
#[instrument(skip_all, fields(session_id = %path))]
pub async fn replace_workbook(
    store: web::Data<SessionStore>,
    path: web::Path<Uuid>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> actix_web::Result<HttpResponse> {
    let session_id = path.into_inner();
    if store.get(&session_id).await.is_none() {
        return Ok(session_not_found());
    }

    let query = query.into_inner();
    let table = load_employee_table(&body, query.sheet.as_deref())
        .map_err(|e| rejected(Some(&session_id), e))?;

    match store.replace_table(&session_id, table, query.file_name).await {
        Some(s) => Ok(HttpResponse::Ok().json(SessionResponse::from(s.as_ref()))),
        None => Ok(session_not_found()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}/records",
    params(
        ("session_id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, body = TablePreviewResponse),
        (status = 404, description = "Session not found")
    ),
    tag = "Payslip"
)]
pub async fn list_records(
    store: web::Data<SessionStore>,
    path: web::Path<Uuid>,
) -> actix_web::Result<HttpResponse> {
    let session = match store.get(&path.into_inner()).await {
        Some(s) => s,
        None => return Ok(session_not_found()),
    };

    Ok(HttpResponse::Ok().json(TablePreviewResponse {
        columns: session.table.columns().to_vec(),
        rows: session.table.preview(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}/employees",
    params(
        ("session_id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, body = EmployeeCodesResponse),
        (status = 404, description = "Session not found")
    ),
    tag = "Payslip"
)]
pub async fn list_employee_codes(
    store: web::Data<SessionStore>,
    path: web::Path<Uuid>,
) -> actix_web::Result<HttpResponse> {
    let session = match store.get(&path.into_inner()).await {
        Some(s) => s,
        None => return Ok(session_not_found()),
    };

    Ok(HttpResponse::Ok().json(EmployeeCodesResponse {
        employee_codes: session.employee_codes().into_iter().map(String::from).collect(),
        selected: session.selected.clone(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/sessions/{session_id}/selection",
    request_body = SelectEmployee,
    params(
        ("session_id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, body = EmployeeCodesResponse),
        (status = 404, description = "Session or employee not found")
    ),
    tag = "Payslip"
)]
#[instrument(skip_all, fields(session_id = %path, employee_code = %body.employee_code))]
pub async fn select_employee(
    store: web::Data<SessionStore>,
    path: web::Path<Uuid>,
    body: web::Json<SelectEmployee>,
) -> actix_web::Result<HttpResponse> {
    let session_id = path.into_inner();

    let session = match store.select(&session_id, &body.employee_code).await {
        Some(result) => result.map_err(|e| rejected(Some(&session_id), e))?,
        None => return Ok(session_not_found()),
    };

    info!(selected = ?session.selected, "Employee selected");

    Ok(HttpResponse::Ok().json(EmployeeCodesResponse {
        employee_codes: session.employee_codes().into_iter().map(String::from).collect(),
        selected: session.selected.clone(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/payslip",
    request_body = GeneratePayslip,
    params(
        ("session_id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Payslip PDF as an attachment named {employee_code}.pdf", content_type = "application/octet-stream"),
        (status = 400, description = "Body is not a JSON payslip request, or no employee code given and none selected"),
        (status = 404, description = "Session or employee not found"),
        (status = 422, description = "Record has a missing or unparseable field")
    ),
    tag = "Payslip"
)]
#[instrument(skip_all, fields(session_id = %path))]
pub async fn generate(
    store: web::Data<SessionStore>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    req: HttpRequest,
    body: web::Bytes,
) -> actix_web::Result<HttpResponse> {
    let session_id = path.into_inner();

    let session = match store.get(&session_id).await {
        Some(s) => s,
        None => return Ok(session_not_found()),
    };

    let request =
        parse_generate_request(&req, &body).map_err(|e| rejected(Some(&session_id), e))?;

    let code = match session.target_code(request.employee_code.as_deref()) {
        Some(code) => code,
        None => {
            warn!("Generate requested with no employee selected");
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "no_selection",
                "message": "Select an employee before generating a payslip"
            })));
        }
    };

    let period = request.period.as_deref().map(str::trim).filter(|p| !p.is_empty());
    let template = match period {
        Some(period) => config.template.for_period(period),
        None => config.template.clone(),
    };

    let payslip = generate_payslip(&session.table, code, &template)
        .map_err(|e| rejected(Some(&session_id), e))?;

    info!(
        employee_code = code,
        bytes = payslip.bytes.len(),
        "Payslip generated"
    );

    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(payslip.file_name)],
        })
        .body(payslip.bytes))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session closed"),
        (status = 404, description = "Session not found")
    ),
    tag = "Payslip"
)]
#[instrument(skip_all, fields(session_id = %path))]
pub async fn close_session(
    store: web::Data<SessionStore>,
    path: web::Path<Uuid>,
) -> actix_web::Result<HttpResponse> {
    if !store.close(&path.into_inner()).await {
        return Ok(session_not_found());
    }

    info!("Session closed");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Session closed"
    })))
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, ContentType};
    use actix_web::web::Data;
    use actix_web::{App, test};

    use super::*;
    use crate::routes;
    use crate::test_support::{employee_cells, jane_doe_cells, page_texts, payroll_workbook};

    fn peer() -> SocketAddr {
        "10.0.0.7:40000".parse().unwrap()
    }

    macro_rules! payslip_app {
        () => {{
            let config = Config::from_lookup(|_| None).unwrap();
            let store = SessionStore::new(config.session_capacity, Duration::from_secs(60));
            let routes_config = config.clone();
            test::init_service(
                App::new()
                    .app_data(Data::new(store))
                    .app_data(Data::new(config))
                    .configure(move |cfg| routes::configure(cfg, routes_config.clone())),
            )
            .await
        }};
    }

    fn upload(uri: &str, bytes: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .peer_addr(peer())
            .set_payload(bytes)
    }

    #[actix_web::test]
    async fn upload_select_generate_roundtrip() {
        let app = payslip_app!();

        let resp = test::call_service(
            &app,
            upload(
                "/api/v1/sessions?file_name=jan.xlsx",
                payroll_workbook(&[jane_doe_cells(), employee_cells("E002", "John Roe")]),
            )
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["rows"], 2);
        assert_eq!(created["source_name"], "jan.xlsx");
        let id = created["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/sessions/{id}/employees"))
            .peer_addr(peer())
            .to_request();
        let codes: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(codes["employee_codes"], json!(["E001", "E002"]));
        assert_eq!(codes["selected"], Value::Null);

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/sessions/{id}/selection"))
            .peer_addr(peer())
            .set_json(json!({ "employee_code": "E001" }))
            .to_request();
        let selected: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(selected["selected"], "E001");

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/payslip"))
            .peer_addr(peer())
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"E001.pdf\""
        );
        let pdf = test::read_body(resp).await;
        let pages = page_texts(&pdf);
        assert!(pages[0].iter().any(|t| t == "Rs. 57000.00"));
        assert!(pages[0].iter().any(|t| t == "15-01-2024"));
    }

    #[actix_web::test]
    async fn explicit_code_and_period_override_the_session() {
        let app = payslip_app!();
        let resp = test::call_service(
            &app,
            upload("/api/v1/sessions", payroll_workbook(&[jane_doe_cells()])).to_request(),
        )
        .await;
        let created: Value = test::read_body_json(resp).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/payslip"))
            .peer_addr(peer())
            .set_json(json!({ "employee_code": "E001", "period": "FEBRUARY 2024" }))
            .to_request();
        let pdf = test::call_and_read_body(&app, req).await;
        assert!(
            page_texts(&pdf)[0]
                .iter()
                .any(|t| t == "SALARY STATEMENT FOR THE MONTH OF FEBRUARY 2024")
        );
    }

    #[actix_web::test]
    async fn failures_map_to_their_status_codes() {
        let app = payslip_app!();

        let resp = test::call_service(
            &app,
            upload("/api/v1/sessions", b"not a spreadsheet".to_vec()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "malformed_input");

        let resp = test::call_service(
            &app,
            upload("/api/v1/sessions", payroll_workbook(&[jane_doe_cells()])).to_request(),
        )
        .await;
        let created: Value = test::read_body_json(resp).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/payslip"))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/payslip"))
            .peer_addr(peer())
            .set_json(json!({ "employee_code": "E999" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Employee ID not found: E999");

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/sessions/{}", Uuid::new_v4()))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Session not found");
    }

    #[actix_web::test]
    async fn reupload_replaces_the_table_and_delete_closes() {
        let app = payslip_app!();
        let resp = test::call_service(
            &app,
            upload("/api/v1/sessions", payroll_workbook(&[jane_doe_cells()])).to_request(),
        )
        .await;
        let created: Value = test::read_body_json(resp).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/sessions/{id}/workbook?file_name=feb.xlsx"))
            .peer_addr(peer())
            .set_payload(payroll_workbook(&[employee_cells("E777", "Zed")]))
            .to_request();
        let replaced: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(replaced["session_id"], id.as_str());
        assert_eq!(replaced["source_name"], "feb.xlsx");

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/sessions/{id}/records"))
            .peer_addr(peer())
            .to_request();
        let preview: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(preview["rows"][0]["Employee Code"], "E777");
        assert_eq!(preview["columns"].as_array().unwrap().len(), 20);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/sessions/{id}"))
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/sessions/{id}/records"))
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn unreadable_generate_bodies_are_rejected_instead_of_using_the_selection() {
        let app = payslip_app!();
        let resp = test::call_service(
            &app,
            upload(
                "/api/v1/sessions",
                payroll_workbook(&[jane_doe_cells(), employee_cells("E002", "John Roe")]),
            )
            .to_request(),
        )
        .await;
        let created: Value = test::read_body_json(resp).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/sessions/{id}/selection"))
            .peer_addr(peer())
            .set_json(json!({ "employee_code": "E001" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let bad_bodies = [
            (ContentType::plaintext().0.to_string(), r#"{"employee_code":"E002"}"#),
            (ContentType::json().0.to_string(), r#"{"employee_code":"E002","#),
            (ContentType::json().0.to_string(), r#"{"employee_code":2,"period":"MAY 2024"}"#),
        ];
        for (content_type, body) in bad_bodies {
            let req = test::TestRequest::post()
                .uri(&format!("/api/v1/sessions/{id}/payslip"))
                .peer_addr(peer())
                .insert_header((CONTENT_TYPE, content_type.as_str()))
                .set_payload(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{content_type} {body}");
            assert!(resp.headers().get(CONTENT_DISPOSITION).is_none());
            let err: Value = test::read_body_json(resp).await;
            assert_eq!(err["error"], "malformed_input");
        }

        // an empty body still falls back to the selection
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/payslip"))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"E001.pdf\""
        );
    }

    #[actix_web::test]
    async fn blank_period_keeps_the_configured_one() {
        let app = payslip_app!();
        let resp = test::call_service(
            &app,
            upload("/api/v1/sessions", payroll_workbook(&[jane_doe_cells()])).to_request(),
        )
        .await;
        let created: Value = test::read_body_json(resp).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/payslip"))
            .peer_addr(peer())
            .set_json(json!({ "employee_code": "E001", "period": "   " }))
            .to_request();
        let pdf = test::call_and_read_body(&app, req).await;
        let texts = &page_texts(&pdf)[0];
        assert!(texts.iter().any(|t| t == "SALARY STATEMENT FOR THE MONTH OF JANUARY 2024"));
        assert!(!texts.iter().any(|t| t == "SALARY STATEMENT FOR THE MONTH OF "));
    }
}
