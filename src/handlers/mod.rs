use actix_web::HttpResponse;
use serde_json::json;
use crate::global_session_manager::Workspace;
use crate::services::gateway::GatewayError;

pub mod auth_handler;
pub mod chat_handler;
pub mod obe_handler;
pub mod session_handler;
pub mod upload_handler;

/// 401 carrying the page the dashboard has to navigate to.
pub fn login_required(target: &str) -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "error": GatewayError::Unauthorized.to_string(),
        "redirect": target,
    }))
}

/// Delivers a login redirect raised by any of the workspace's backend calls,
/// including background ones, that the browser has not seen yet.
pub fn pending_redirect(workspace: &Workspace) -> Option<HttpResponse> {
    workspace.take_redirect().map(|target| login_required(&target))
}

/// Maps a backend failure onto the bridge's response.
pub fn gateway_error_response(workspace: &Workspace, error: &GatewayError) -> HttpResponse {
    if let Some(response) = pending_redirect(workspace) {
        return response;
    }
    match error {
        GatewayError::Unauthorized => login_required(workspace.gateway.login_path()),
        GatewayError::Server { status, .. } if (400..500).contains(status) => {
            HttpResponse::BadRequest().json(json!({ "error": error.to_string() }))
        }
        _ => HttpResponse::BadGateway().json(json!({ "error": error.to_string() })),
    }
}
