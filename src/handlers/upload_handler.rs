use actix_session::Session;
use actix_web::{web, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use crate::global_session_manager::Workspace;
use crate::handlers::pending_redirect;
use crate::handlers::session_handler::ensure_workspace;
use crate::models::ingestion_task::{IngestionError, IngestionTask};
use crate::routes::app_state::AppState;
use crate::services::upload_service::UploadFile;

const DEFAULT_SUBJECT: &str = "General";
const DEFAULT_DOCUMENT_TYPE: &str = "other";

#[derive(Debug, Deserialize)]
pub struct UploadEntry {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    /// Base64 file content; only read when uploads go to the backend.
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub files: Vec<UploadEntry>,
}

#[derive(Debug, Serialize)]
struct Rejected {
    filename: String,
    error: String,
}

pub async fn list_uploads(data: web::Data<AppState>, session: Session) -> HttpResponse {
    let (_, workspace) = ensure_workspace(&data, &session).await;
    if let Some(response) = pending_redirect(&workspace) {
        return response;
    }
    HttpResponse::Ok().json(workspace.uploads.snapshot())
}

pub async fn handle_upload_request(
    data: web::Data<AppState>,
    session: Session,
    req_body: web::Json<UploadRequest>,
) -> HttpResponse {
    let (session_id, workspace) = ensure_workspace(&data, &session).await;
    if let Some(response) = pending_redirect(&workspace) {
        return response;
    }
    let request = req_body.into_inner();
    if request.files.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": "No files provided" }));
    }

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for entry in request.files {
        let filename = entry.filename.clone();
        match start_ingestion(&workspace, entry) {
            Ok(task) => accepted.push(task),
            Err(error) => {
                warn!("Rejected {} for workspace {}: {}", filename, session_id, error);
                rejected.push(Rejected { filename, error });
            }
        }
    }
    info!("Workspace {} queued {} file(s)", session_id, accepted.len());

    let body = json!({ "tasks": accepted, "rejected": rejected });
    if accepted.is_empty() {
        HttpResponse::BadRequest().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}

fn start_ingestion(workspace: &Workspace, entry: UploadEntry) -> Result<IngestionTask, String> {
    let Some(uploader) = &workspace.uploader else {
        return workspace.uploads.enqueue(&entry.filename).map_err(|e| e.to_string());
    };
    let content = entry.content.ok_or_else(|| "File content is required".to_string())?;
    let bytes = STANDARD
        .decode(content.trim())
        .map_err(|e| format!("File content is not valid base64: {}", e))?;
    let file = UploadFile {
        filename: entry.filename,
        title: entry.title,
        subject: entry.subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        document_type: entry.document_type.unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string()),
        bytes,
    };
    uploader.upload(file).map_err(|e| e.to_string())
}

pub async fn handle_cancel_request(
    data: web::Data<AppState>,
    session: Session,
    task_id: String,
) -> HttpResponse {
    let (_, workspace) = ensure_workspace(&data, &session).await;
    match workspace.uploads.cancel(&task_id) {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(e @ IngestionError::NotFound(_)) => HttpResponse::NotFound().json(json!({ "error": e.to_string() })),
        Err(e @ IngestionError::AlreadyComplete(_)) => {
            HttpResponse::Conflict().json(json!({ "error": e.to_string() }))
        }
        Err(e) => HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
    }
}
