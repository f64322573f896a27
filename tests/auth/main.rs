#[path = "../common/mod.rs"]
mod common;

use acad_rag_console::services::auth_service::{AuthError, AuthService};
use acad_rag_console::services::gateway::{GatewayError, RequestBody};
use common::{Harness, ScriptedTransport};
use reqwest::Method;
use serde_json::json;

fn service(harness: &Harness) -> AuthService {
    AuthService::new(harness.gateway.clone(), harness.context.clone())
}

#[tokio::test]
async fn test_login_stores_the_token_and_loads_the_profile() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(200, json!({ "access_token": "jwt-new", "token_type": "bearer" }))
        .push_json(200, json!({ "id": 4, "name": "Dr. Rao", "email": "rao@college.edu", "role": "faculty" }));
    let harness = Harness::new(transport, None);
    let auth = service(&harness);
    assert!(auth.session().loading);

    let user = auth.login("rao@college.edu", "secret").await.unwrap();
    assert_eq!(user.name.as_deref(), Some("Dr. Rao"));
    assert_eq!(harness.stored_token().as_deref(), Some("jwt-new"));

    let session = auth.session();
    assert!(session.is_authenticated());
    assert!(!session.loading);

    let requests = harness.transport.requests();
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/auth/login");
    assert_eq!(requests[0].bearer, None);
    assert_eq!(
        requests[0].body,
        RequestBody::Json(json!({ "email": "rao@college.edu", "password": "secret" }))
    );
    assert_eq!(requests[1].path, "/auth/me");
    assert_eq!(requests[1].bearer.as_deref(), Some("jwt-new"));
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let harness = Harness::new(ScriptedTransport::new(), None);
    let auth = service(&harness);
    assert!(matches!(auth.login(" ", "secret").await, Err(AuthError::MissingCredentials)));
    assert!(matches!(auth.login("rao@college.edu", "").await, Err(AuthError::MissingCredentials)));
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_wrong_password_clears_state_and_redirects() {
    let transport = ScriptedTransport::new();
    transport.push_json(401, json!({ "detail": "Incorrect email or password" }));
    let harness = Harness::new(transport, None);
    let auth = service(&harness);

    let result = auth.login("rao@college.edu", "wrong").await;
    assert!(matches!(result, Err(AuthError::Gateway(GatewayError::Unauthorized))));
    assert_eq!(harness.stored_token(), None);
    assert_eq!(harness.redirects.count(), 1);
}

#[tokio::test]
async fn test_refresh_with_a_stale_token_signs_out_once() {
    let transport = ScriptedTransport::new();
    transport.push_json(401, json!({ "detail": "Token expired" }));
    let harness = Harness::new(transport, Some("stale"));
    let auth = service(&harness);

    assert_eq!(auth.refresh().await, None);
    assert_eq!(harness.stored_token(), None);
    assert_eq!(harness.redirects.count(), 1);
    let session = auth.session();
    assert!(!session.is_authenticated());
    assert!(!session.loading);
}

#[tokio::test]
async fn test_logout_forgets_the_user() {
    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({ "id": "u-1", "name": "Dr. Rao" }));
    let harness = Harness::new(transport, Some("jwt"));
    let auth = service(&harness);
    assert!(auth.refresh().await.is_some());

    auth.logout();
    assert_eq!(harness.stored_token(), None);
    assert!(auth.session().user.is_none());
    assert_eq!(harness.redirects.last_target().as_deref(), Some("/auth/login"));
    assert_eq!(harness.transport.requests().len(), 1);
}
