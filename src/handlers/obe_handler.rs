use actix_session::Session;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use crate::handlers::gateway_error_response;
use crate::handlers::session_handler::ensure_workspace;
use crate::models::obe::ReportRequest;
use crate::routes::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct AttainmentQuery {
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportForm {
    pub subject: String,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub report_type: Option<String>,
}

impl From<ReportForm> for ReportRequest {
    fn from(form: ReportForm) -> Self {
        let mut request = ReportRequest::comprehensive(&form.subject);
        request.semester = form.semester;
        request.academic_year = form.academic_year;
        if let Some(report_type) = form.report_type {
            request.report_type = report_type;
        }
        request
    }
}

pub async fn co_attainment(
    data: web::Data<AppState>,
    session: Session,
    query: web::Query<AttainmentQuery>,
) -> HttpResponse {
    let (_, workspace) = ensure_workspace(&data, &session).await;
    match workspace.obe.co_attainment(query.subject.as_deref()).await {
        Ok(attainments) => HttpResponse::Ok().json(json!({ "co_attainment": attainments })),
        Err(e) => gateway_error_response(&workspace, &e),
    }
}

pub async fn generate_report(
    data: web::Data<AppState>,
    session: Session,
    form: web::Json<ReportForm>,
) -> HttpResponse {
    if form.subject.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": "Subject is required" }));
    }
    let (_, workspace) = ensure_workspace(&data, &session).await;
    let request = ReportRequest::from(form.into_inner());
    match workspace.obe.generate_report(&request).await {
        Ok(artifact) => HttpResponse::Ok()
            .content_type(artifact.content_type.as_str())
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(artifact.filename.clone())],
            })
            .body(artifact.bytes),
        Err(e) => gateway_error_response(&workspace, &e),
    }
}
