use std::sync::Arc;
use crate::config::AppConfig;
use crate::global_session_manager::{GlobalSessionManager, Workspace};
use crate::models::ingestion_task::ProgressPlan;
use crate::services::auth_service::{AuthContext, AuthService};
use crate::services::gateway::{Gateway, ReqwestTransport, RedirectRecorder, Transport, TransportError};
use crate::token_store::{FileTokenStore, TokenStore};

#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn Transport>,
    pub context: Arc<AuthContext>,
    pub login_path: String,
    /// Process-level auth, used before any browser has connected.
    pub auth: AuthService,
    pub session_manager: GlobalSessionManager,
    pub plan: ProgressPlan,
    pub simulate_ingestion: bool,
}

impl AppState {
    /// Wires the services over a real HTTP transport and the on-disk token cache.
    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(&config.api_base_url, config.request_timeout)?;
        let store = FileTokenStore::new(&config.token_cache_file);
        Ok(AppState::assemble(
            Arc::new(transport),
            Arc::new(store),
            &config.login_path,
            config.simulate_ingestion,
        ))
    }

    /// Wires the services over any transport and token store.
    pub fn assemble(
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
        login_path: &str,
        simulate_ingestion: bool,
    ) -> Self {
        let context = Arc::new(AuthContext::new(store));
        let gateway = Arc::new(Gateway::new(
            transport.clone(),
            context.clone(),
            Arc::new(RedirectRecorder::new()),
            login_path,
        ));
        AppState {
            auth: AuthService::new(gateway, context.clone()),
            transport,
            context,
            login_path: login_path.to_string(),
            session_manager: GlobalSessionManager::new(),
            plan: ProgressPlan::default(),
            simulate_ingestion,
        }
    }

    /// Opens a workspace with its own gateway, so login redirects raised by
    /// its calls reach only the browser that owns it.
    pub async fn open_workspace(&self) -> Workspace {
        let redirects = Arc::new(RedirectRecorder::new());
        let gateway = Arc::new(Gateway::new(
            self.transport.clone(),
            self.context.clone(),
            redirects.clone(),
            &self.login_path,
        ));
        Workspace::open(gateway, redirects, self.context.clone(), self.plan, self.simulate_ingestion).await
    }
}
