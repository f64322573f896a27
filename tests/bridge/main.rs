#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::{Cookie, Key};
use actix_web::{test, web, App};
use acad_rag_console::routes::{self, app_state::AppState};
use acad_rag_console::services::gateway::CredentialProvider;
use acad_rag_console::token_store::MemoryTokenStore;
use common::ScriptedTransport;
use serde_json::{json, Value};

fn state(transport: ScriptedTransport) -> (AppState, Arc<ScriptedTransport>) {
    state_with_ingestion(transport, true)
}

fn state_with_ingestion(transport: ScriptedTransport, simulate: bool) -> (AppState, Arc<ScriptedTransport>) {
    common::init_logging();
    let transport = Arc::new(transport);
    let state = AppState::assemble(
        transport.clone(),
        Arc::new(MemoryTokenStore::with_token("jwt")),
        "/auth/login",
        simulate,
    );
    (state, transport)
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new($state.clone()))
                .configure(routes::configure),
        )
        .await
    };
}

macro_rules! open_session {
    ($app:expr) => {{
        let resp = test::call_service(&$app, test::TestRequest::get().uri("/api/session").to_request()).await;
        assert!(resp.status().is_success());
        let cookie: Cookie<'static> = resp
            .response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned();
        let body: Value = test::read_body_json(resp).await;
        (cookie, body)
    }};
}

#[actix_web::test]
async fn test_chat_round_trip_through_the_bridge() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(200, json!({ "queries": [] }))
        .push_json(200, json!({ "answer": "CO3", "session_id": "s-1" }));
    let (state, transport) = state(transport);
    let app = app!(state);

    let (cookie, body) = open_session!(app);
    assert_eq!(body["initialized"], true);

    let blank = test::TestRequest::post()
        .uri("/api/chat")
        .cookie(cookie.clone())
        .set_json(json!({ "message": "  " }))
        .to_request();
    assert_eq!(test::call_service(&app, blank).await.status(), 400);

    let ask = test::TestRequest::post()
        .uri("/api/chat")
        .cookie(cookie.clone())
        .set_json(json!({ "message": "Which CO covers Unit 3?", "subject": "DS" }))
        .to_request();
    let chat: Value = test::call_and_read_body_json(&app, ask).await;
    assert_eq!(chat["messages"].as_array().map(Vec::len), Some(2));
    assert_eq!(chat["session_id"], "s-1");
    assert_eq!(chat["state"], "idle");

    assert_eq!(transport.paths(), vec!["/rag/history", "/rag/query"]);
    assert_eq!(state.session_manager.len(), 1);
}

#[actix_web::test]
async fn test_unauthorized_backend_asks_the_dashboard_to_redirect() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(200, json!({ "queries": [] }))
        .push_json(401, json!({ "detail": "Not authenticated" }));
    let (state, _transport) = state(transport);
    let app = app!(state);

    let (cookie, _) = open_session!(app);
    let ask = test::TestRequest::post()
        .uri("/api/chat")
        .cookie(cookie.clone())
        .set_json(json!({ "message": "hello" }))
        .to_request();
    let resp = test::call_service(&app, ask).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["redirect"], "/auth/login");

    let after = test::TestRequest::get().uri("/api/chat").cookie(cookie).to_request();
    assert!(test::call_service(&app, after).await.status().is_success());
}

#[actix_web::test]
async fn test_uploads_are_tracked_per_workspace() {
    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({ "queries": [] }));
    let (state, _transport) = state(transport);
    let app = app!(state);

    let (cookie, _) = open_session!(app);
    let batch = test::TestRequest::post()
        .uri("/api/uploads")
        .cookie(cookie.clone())
        .set_json(json!({ "files": [{ "filename": "DS_Syllabus_2024.pdf" }, { "filename": "notes.txt" }] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, batch).await;
    assert_eq!(body["tasks"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["rejected"][0]["filename"], "notes.txt");
    let id = body["tasks"][0]["id"].as_str().unwrap().to_string();

    let missing = test::TestRequest::delete()
        .uri("/api/uploads/no-such-task")
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, missing).await.status(), 404);

    let cancel = test::TestRequest::delete()
        .uri(&format!("/api/uploads/{}", id))
        .cookie(cookie.clone())
        .to_request();
    assert!(test::call_service(&app, cancel).await.status().is_success());

    let list = test::TestRequest::get().uri("/api/uploads").cookie(cookie).to_request();
    let tasks: Value = test::call_and_read_body_json(&app, list).await;
    assert_eq!(tasks.as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn test_rejected_history_load_redirects_once() {
    let transport = ScriptedTransport::new();
    transport.push_json(401, json!({ "detail": "Token expired" }));
    let (state, _transport) = state(transport);
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/session").to_request()).await;
    assert_eq!(resp.status(), 401);
    let cookie = resp.response().cookies().next().expect("session cookie").into_owned();
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["redirect"], "/auth/login");
    assert_eq!(state.context.bearer_token(), None);

    let again = test::TestRequest::get().uri("/api/session").cookie(cookie).to_request();
    assert!(test::call_service(&app, again).await.status().is_success());
}

#[actix_web::test]
async fn test_profile_check_with_a_stale_token_redirects() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(200, json!({ "queries": [] }))
        .push_json(401, json!({ "detail": "Token expired" }));
    let (state, _transport) = state(transport);
    let app = app!(state);

    let (cookie, _) = open_session!(app);
    let me = test::TestRequest::get().uri("/api/auth/me").cookie(cookie).to_request();
    let resp = test::call_service(&app, me).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["redirect"], "/auth/login");
}

#[actix_web::test]
async fn test_background_upload_rejection_reaches_the_next_poll() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(200, json!({ "queries": [] }))
        .push_json(401, json!({ "detail": "Not authenticated" }));
    let (state, transport) = state_with_ingestion(transport, false);
    let app = app!(state);

    let (cookie, body) = open_session!(app);
    assert_eq!(body["simulated_ingestion"], false);
    let upload = test::TestRequest::post()
        .uri("/api/uploads")
        .cookie(cookie.clone())
        .set_json(json!({ "files": [{ "filename": "DS_Syllabus_2024.pdf", "subject": "DS", "content": "JVBERi0xLjQ=" }] }))
        .to_request();
    assert!(test::call_service(&app, upload).await.status().is_success());

    for _ in 0..100 {
        if transport.requests().len() == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(transport.paths(), vec!["/rag/history", "/documents/upload"]);

    let poll = test::TestRequest::get().uri("/api/uploads").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, poll).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["redirect"], "/auth/login");

    let next = test::TestRequest::get().uri("/api/uploads").cookie(cookie).to_request();
    let tasks: Value = test::call_and_read_body_json(&app, next).await;
    assert_eq!(tasks[0]["stage"]["kind"], "failed");
}
