use actix_web::{get, post, web, Responder};
use actix_session::Session;
use crate::handlers::auth_handler::{self, LoginForm};
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(me).service(login).service(logout);
}

#[get("/api/auth/me")]
async fn me(data: web::Data<AppState>, session: Session) -> impl Responder {
    auth_handler::current_user(data, session).await
}

#[post("/api/auth/login")]
async fn login(data: web::Data<AppState>, session: Session, form: web::Json<LoginForm>) -> impl Responder {
    auth_handler::login(data, session, form).await
}

#[post("/api/auth/logout")]
async fn logout(data: web::Data<AppState>, session: Session) -> impl Responder {
    auth_handler::logout(data, session).await
}
