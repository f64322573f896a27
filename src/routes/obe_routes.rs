use actix_web::{get, post, web, Responder};
use actix_session::Session;
use crate::handlers::obe_handler::{self, AttainmentQuery, ReportForm};
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(co_attainment).service(report);
}

#[get("/api/obe/co-attainment")]
async fn co_attainment(
    data: web::Data<AppState>,
    session: Session,
    query: web::Query<AttainmentQuery>,
) -> impl Responder {
    obe_handler::co_attainment(data, session, query).await
}

#[post("/api/obe/report")]
async fn report(data: web::Data<AppState>, session: Session, form: web::Json<ReportForm>) -> impl Responder {
    obe_handler::generate_report(data, session, form).await
}
