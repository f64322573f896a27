use actix_session::Session;
use actix_web::{web, HttpResponse};
use log::{error, info, warn};
use serde_json::json;
use uuid::Uuid;
use crate::global_session_manager::Workspace;
use crate::handlers::pending_redirect;
use crate::routes::app_state::AppState;

const SESSION_KEY: &str = "session_id";

/// Returns the caller's workspace id and workspace, creating both on first use.
pub async fn ensure_workspace(data: &AppState, session: &Session) -> (String, Workspace) {
    let session_id = match session.get::<String>(SESSION_KEY) {
        Ok(Some(id)) => id,
        Ok(None) => new_session_id(session),
        Err(e) => {
            warn!("Unreadable session cookie ({}); starting a new workspace", e);
            new_session_id(session)
        }
    };

    if let Some(workspace) = data.session_manager.get(&session_id) {
        return (session_id, workspace);
    }

    info!("Opening workspace {}", session_id);
    let workspace = data.open_workspace().await;
    let workspace = data.session_manager.insert(session_id.clone(), workspace);
    (session_id, workspace)
}

fn new_session_id(session: &Session) -> String {
    let session_id = Uuid::new_v4().to_string();
    if let Err(e) = session.insert(SESSION_KEY, session_id.clone()) {
        error!("Failed to insert session_id into cookie: {:?}", e);
    } else {
        info!("Stored session_id {} in cookie", session_id);
    }
    session_id
}

pub async fn initialize_session(data: web::Data<AppState>, session: Session) -> HttpResponse {
    let (session_id, workspace) = ensure_workspace(&data, &session).await;
    if let Some(response) = pending_redirect(&workspace) {
        warn!("Workspace {} needs a fresh login", session_id);
        return response;
    }
    HttpResponse::Ok().json(json!({
        "initialized": true,
        "session_id": session_id,
        "chat": workspace.chat.snapshot(),
        "uploads": workspace.uploads.snapshot(),
        "simulated_ingestion": workspace.uploader.is_none(),
    }))
}

/// Drops the workspace bound to this cookie.
pub fn close_session(data: web::Data<AppState>, session: Session) -> bool {
    let closed = match session.get::<String>(SESSION_KEY) {
        Ok(Some(id)) => data.session_manager.remove(&id).is_some(),
        _ => false,
    };
    session.purge();
    closed
}
