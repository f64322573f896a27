use actix_files::Files;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use acad_rag_console::config::{self, AppConfig};
use acad_rag_console::routes::{self, app_state::AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    config::init_logging();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let state = AppState::from_config(&config).context("Could not build the HTTP client")?;
    state.auth.refresh().await;

    let key = Key::generate();
    let static_dir = config.static_dir.clone();
    log::info!(
        "Starting server on http://{}:{} (backend {}, simulated ingestion: {})",
        config.bind_host,
        config.bind_port,
        config.api_base_url,
        config.simulate_ingestion
    );
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
            .service(Files::new("/", static_dir.as_str()).index_file("index.html"))
    })
    .bind((config.bind_host.as_str(), config.bind_port))?
    .run()
    .await?;
    Ok(())
}
