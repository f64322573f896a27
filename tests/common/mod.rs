#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use acad_rag_console::services::gateway::{
    ApiRequest, ApiResponse, Gateway, RedirectRecorder, Transport, TransportError,
};
use acad_rag_console::services::auth_service::AuthContext;
use acad_rag_console::token_store::{MemoryTokenStore, TokenStore};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Replays canned responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: Mutex<Vec<ApiRequest>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        ScriptedTransport::default()
    }

    /// Holds every response until the returned `Notify` is signalled.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let transport = ScriptedTransport {
            gate: Some(gate.clone()),
            ..ScriptedTransport::default()
        };
        (transport, gate)
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push(Ok(ApiResponse::json_body(status, &body)))
    }

    pub fn push_failure(&self, message: &str) -> &Self {
        self.push(Err(TransportError(message.to_string())))
    }

    pub fn push(&self, response: Result<ApiResponse, TransportError>) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError(format!("no scripted response for {}", request.path))))
    }
}

/// A gateway over `transport`, with its token store and redirect recorder
/// exposed for assertions.
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryTokenStore>,
    pub context: Arc<AuthContext>,
    pub redirects: Arc<RedirectRecorder>,
    pub gateway: Arc<Gateway>,
}

impl Harness {
    pub fn new(transport: ScriptedTransport, token: Option<&str>) -> Self {
        init_logging();
        let transport = Arc::new(transport);
        let store = Arc::new(match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::new(),
        });
        let context = Arc::new(AuthContext::new(store.clone() as Arc<dyn TokenStore>));
        let redirects = Arc::new(RedirectRecorder::new());
        let gateway = Arc::new(Gateway::new(
            transport.clone(),
            context.clone(),
            redirects.clone(),
            "/auth/login",
        ));
        Harness {
            transport,
            store,
            context,
            redirects,
            gateway,
        }
    }

    pub fn stored_token(&self) -> Option<String> {
        self.store.load().unwrap()
    }
}
