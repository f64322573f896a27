use actix_web::{delete, get, post, web, Responder};
use actix_session::Session;
use crate::handlers::upload_handler::{self, UploadRequest};
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_uploads).service(post_uploads).service(cancel_upload);
}

#[get("/api/uploads")]
async fn get_uploads(data: web::Data<AppState>, session: Session) -> impl Responder {
    upload_handler::list_uploads(data, session).await
}

#[post("/api/uploads")]
async fn post_uploads(
    data: web::Data<AppState>,
    session: Session,
    req_body: web::Json<UploadRequest>,
) -> impl Responder {
    upload_handler::handle_upload_request(data, session, req_body).await
}

#[delete("/api/uploads/{id}")]
async fn cancel_upload(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> impl Responder {
    upload_handler::handle_cancel_request(data, session, path.into_inner()).await
}
