use actix_web::{delete, get, web, HttpResponse, Responder};
use crate::routes::app_state::AppState;
use actix_session::Session;
use serde_json::json;
use crate::handlers::session_handler;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(init_session).service(close_session);
}

#[get("/api/session")]
async fn init_session(data: web::Data<AppState>, session: Session) -> impl Responder {
    session_handler::initialize_session(data, session).await
}

#[delete("/api/session")]
async fn close_session(data: web::Data<AppState>, session: Session) -> impl Responder {
    let closed = session_handler::close_session(data, session);
    HttpResponse::Ok().json(json!({ "closed": closed }))
}
