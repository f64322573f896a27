use actix_web::{get, post, web, Responder};
use actix_session::Session;
use crate::handlers::chat_handler::{self, ChatRequest};
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_chat).service(post_chat);
}

#[get("/api/chat")]
async fn get_chat(data: web::Data<AppState>, session: Session) -> impl Responder {
    chat_handler::chat_snapshot(data, session).await
}

#[post("/api/chat")]
async fn post_chat(
    data: web::Data<AppState>,
    session: Session,
    req_body: web::Json<ChatRequest>,
) -> impl Responder {
    chat_handler::handle_chat_request(data, session, req_body).await
}
