use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// A file plus the form fields that accompany it in a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadForm {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    fn into_multipart(self) -> Form {
        let part = Part::bytes(self.bytes).file_name(self.filename);
        self.fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part("file", part)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(UploadForm),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        ApiResponse {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn json_body(status: u16, value: &Value) -> Self {
        ApiResponse::new(status, value.to_string().into_bytes())
            .with_header("content-type", "application/json")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        serde_json::from_slice(&self.body).map_err(|e| GatewayError::InvalidPayload(e.to_string()))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        TransportError(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Not authorized; login required")]
    Unauthorized,

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response payload: {0}")]
    InvalidPayload(String),
}

impl GatewayError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Unauthorized)
    }
}

/// Moves one request over the wire. The gateway owns auth policy; a
/// transport only performs I/O.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Source of the bearer token, injected so the gateway never reads storage
/// directly.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
    /// Forget the token and any cached user knowledge.
    fn invalidate(&self);
}

/// Performs the hard navigation to the login entry point.
pub trait LoginNavigator: Send + Sync {
    fn navigate_to_login(&self, login_path: &str);
}

/// Navigator for headless hosts: logs the redirect and keeps it pending until
/// the surrounding surface forwards it to the browser.
#[derive(Default)]
pub struct RedirectRecorder {
    count: AtomicUsize,
    last_target: Mutex<Option<String>>,
    pending: Mutex<Option<String>>,
}

impl RedirectRecorder {
    pub fn new() -> Self {
        RedirectRecorder::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn last_target(&self) -> Option<String> {
        self.last_target.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Hands over a navigation that has not been delivered yet, once.
    pub fn take_pending(&self) -> Option<String> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner()).take()
    }
}

impl LoginNavigator for RedirectRecorder {
    fn navigate_to_login(&self, login_path: &str) {
        warn!("Redirecting to login at {}", login_path);
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.last_target.lock().unwrap_or_else(|p| p.into_inner()) = Some(login_path.to_string());
        *self.pending.lock().unwrap_or_else(|p| p.into_inner()) = Some(login_path.to_string());
    }
}

/// `reqwest`-backed transport rooted at the RAG backend's base URL.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.clone();
        // Url::join replaces the last segment unless the base ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(ReqwestTransport { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError(format!("Invalid request path {}: {}", path, e)))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint(&request.path)?;
        let mut builder = self.client.request(request.method, url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form.into_multipart()),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();
        Ok(ApiResponse { status, headers, body })
    }
}

/// Every outbound call to the RAG backend goes through here.
pub struct Gateway {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    navigator: Arc<dyn LoginNavigator>,
    login_path: String,
}

impl Gateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        navigator: Arc<dyn LoginNavigator>,
        login_path: &str,
    ) -> Self {
        Gateway {
            transport,
            credentials,
            navigator,
            login_path: login_path.to_string(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Sends one request with the current bearer token attached.
    ///
    /// A 401 clears credentials and navigates to login before the failure is
    /// returned; nothing is retried.
    pub async fn send(&self, method: Method, path: &str, body: RequestBody) -> Result<ApiResponse, GatewayError> {
        let request = ApiRequest {
            method: method.clone(),
            path: path.to_string(),
            body,
            bearer: self.credentials.bearer_token(),
        };
        debug!("{} {} (authenticated: {})", method, path, request.bearer.is_some());

        let response = self.transport.execute(request).await.map_err(|e| {
            error!("{} {} failed in transport: {}", method, path, e);
            GatewayError::Network(e.to_string())
        })?;

        if response.is_success() {
            return Ok(response);
        }

        if response.status == StatusCode::UNAUTHORIZED.as_u16() {
            warn!("{} {} was rejected as unauthorized; clearing credentials", method, path);
            self.credentials.invalidate();
            self.redirect_to_login();
            return Err(GatewayError::Unauthorized);
        }

        let message = server_message(&response);
        error!("{} {} returned {}: {}", method, path, response.status, message);
        Err(GatewayError::Server {
            status: response.status,
            message,
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.send(Method::GET, path, RequestBody::Empty).await?.json()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let value = serde_json::to_value(body).map_err(|e| GatewayError::InvalidPayload(e.to_string()))?;
        self.send(Method::POST, path, RequestBody::Json(value)).await?.json()
    }

    pub fn redirect_to_login(&self) {
        self.navigator.navigate_to_login(&self.login_path);
    }
}

/// FastAPI puts the reason in `detail`; fall back to the raw body, then the
/// status reason phrase.
fn server_message(response: &ApiResponse) -> String {
    if let Ok(payload) = serde_json::from_slice::<Value>(&response.body) {
        match payload.get("detail") {
            Some(Value::String(detail)) => return detail.clone(),
            Some(detail) if !detail.is_null() => return detail.to_string(),
            _ => {}
        }
    }
    let text = response.text();
    let text = text.trim();
    if !text.is_empty() {
        return text.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    }
    StatusCode::from_u16(response.status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string()
}
