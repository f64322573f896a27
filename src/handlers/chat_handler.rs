use actix_session::Session;
use actix_web::{web, HttpResponse};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use crate::handlers::{gateway_error_response, pending_redirect};
use crate::handlers::session_handler::ensure_workspace;
use crate::models::chat_session::ValidationError;
use crate::routes::app_state::AppState;
use crate::services::chat_service::SubmitOutcome;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub subject: Option<String>,
}

pub async fn chat_snapshot(data: web::Data<AppState>, session: Session) -> HttpResponse {
    let (_, workspace) = ensure_workspace(&data, &session).await;
    if let Some(response) = pending_redirect(&workspace) {
        return response;
    }
    HttpResponse::Ok().json(workspace.chat.snapshot())
}

pub async fn handle_chat_request(
    data: web::Data<AppState>,
    session: Session,
    req_body: web::Json<ChatRequest>,
) -> HttpResponse {
    let (session_id, workspace) = ensure_workspace(&data, &session).await;
    if let Some(response) = pending_redirect(&workspace) {
        return response;
    }
    let request = req_body.into_inner();
    let subject = request.subject.as_deref().map(str::trim).filter(|s| !s.is_empty());
    info!("Processing message for workspace {}", session_id);

    match workspace.chat.submit_with_subject(&request.message, subject).await {
        Ok(SubmitOutcome::Answered) => HttpResponse::Ok().json(workspace.chat.snapshot()),
        Ok(SubmitOutcome::Failed(e)) if e.is_unauthorized() => gateway_error_response(&workspace, &e),
        Ok(SubmitOutcome::Failed(e)) => HttpResponse::BadGateway().json(json!({
            "error": e.to_string(),
            "chat": workspace.chat.snapshot(),
        })),
        Err(e @ ValidationError::EmptyQuery) => {
            HttpResponse::BadRequest().json(json!({ "error": e.to_string() }))
        }
        Err(e @ ValidationError::QueryInFlight) => {
            warn!("Workspace {} submitted while a query was outstanding", session_id);
            HttpResponse::Conflict().json(json!({ "error": e.to_string() }))
        }
    }
}
