pub mod app_state;
pub mod auth_routes;
pub mod chat_routes;
pub mod obe_routes;
pub mod session_routes;
pub mod upload_routes;

use actix_web::web;

/// Registers every API route; static files are mounted separately.
pub fn configure(cfg: &mut web::ServiceConfig) {
    session_routes::init_routes(cfg);
    chat_routes::init_routes(cfg);
    upload_routes::init_routes(cfg);
    auth_routes::init_routes(cfg);
    obe_routes::init_routes(cfg);
}
