use actix_session::Session;
use actix_web::{web, HttpResponse};
use log::error;
use serde::Deserialize;
use serde_json::json;
use crate::handlers::{gateway_error_response, pending_redirect};
use crate::handlers::session_handler::ensure_workspace;
use crate::routes::app_state::AppState;
use crate::services::auth_service::AuthError;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn current_user(data: web::Data<AppState>, session: Session) -> HttpResponse {
    let (_, workspace) = ensure_workspace(&data, &session).await;
    workspace.auth.refresh().await;
    if let Some(response) = pending_redirect(&workspace) {
        return response;
    }
    HttpResponse::Ok().json(workspace.auth.session())
}

pub async fn login(data: web::Data<AppState>, session: Session, form: web::Json<LoginForm>) -> HttpResponse {
    let (_, workspace) = ensure_workspace(&data, &session).await;
    // A redirect raised before this attempt is already being acted on.
    workspace.take_redirect();
    match workspace.auth.login(&form.email, &form.password).await {
        Ok(user) => HttpResponse::Ok().json(json!({ "user": user })),
        Err(AuthError::MissingCredentials) => {
            HttpResponse::BadRequest().json(json!({ "error": AuthError::MissingCredentials.to_string() }))
        }
        Err(AuthError::Gateway(e)) => gateway_error_response(&workspace, &e),
        Err(e) => {
            error!("Login failed: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }))
        }
    }
}

pub async fn logout(data: web::Data<AppState>, session: Session) -> HttpResponse {
    let (_, workspace) = ensure_workspace(&data, &session).await;
    workspace.auth.logout();
    let target = workspace
        .take_redirect()
        .unwrap_or_else(|| workspace.gateway.login_path().to_string());
    HttpResponse::Ok().json(json!({ "redirect": target }))
}
