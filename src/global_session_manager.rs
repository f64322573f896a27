use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use log::info;
use tokio::time::Instant;
use crate::models::ingestion_task::ProgressPlan;
use crate::services::auth_service::{AuthContext, AuthService};
use crate::services::chat_service::QuerySession;
use crate::services::gateway::{Gateway, RedirectRecorder};
use crate::services::ingestion_service::{IngestionTracker, ProgressDriver};
use crate::services::obe_service::ObeService;
use crate::services::upload_service::DocumentUploader;

const DEFAULT_CAPACITY: usize = 256;
const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Everything one browser works with: its conversation, its uploads and the
/// login redirects raised on its behalf.
#[derive(Clone)]
pub struct Workspace {
    pub gateway: Arc<Gateway>,
    pub redirects: Arc<RedirectRecorder>,
    pub auth: AuthService,
    pub obe: ObeService,
    pub chat: QuerySession,
    pub uploads: IngestionTracker,
    /// Present when uploads go to the real backend instead of the simulation.
    pub uploader: Option<DocumentUploader>,
}

impl Workspace {
    /// Opens a workspace whose backend calls report login redirects to
    /// `redirects`.
    pub async fn open(
        gateway: Arc<Gateway>,
        redirects: Arc<RedirectRecorder>,
        context: Arc<AuthContext>,
        plan: ProgressPlan,
        simulate_ingestion: bool,
    ) -> Self {
        let chat = QuerySession::start(gateway.clone()).await;
        let (uploads, uploader) = if simulate_ingestion {
            (IngestionTracker::new(plan, ProgressDriver::Simulated), None)
        } else {
            let uploads = IngestionTracker::new(plan, ProgressDriver::Manual);
            let uploader = DocumentUploader::new(gateway.clone(), uploads.clone());
            (uploads, Some(uploader))
        };
        Workspace {
            auth: AuthService::new(gateway.clone(), context),
            obe: ObeService::new(gateway.clone()),
            gateway,
            redirects,
            chat,
            uploads,
            uploader,
        }
    }

    /// The login redirect this browser has not been told about yet.
    pub fn take_redirect(&self) -> Option<String> {
        self.redirects.take_pending()
    }
}

struct Slot {
    workspace: Workspace,
    last_used: Instant,
}

/// Workspaces keyed by the id stored in the browser's session cookie.
///
/// Workspaces idle for longer than the TTL are dropped on the next insert, and
/// the least recently used one makes room once the map is full.
#[derive(Clone)]
pub struct GlobalSessionManager {
    workspaces: Arc<Mutex<HashMap<String, Slot>>>,
    capacity: usize,
    idle_ttl: Duration,
}

impl Default for GlobalSessionManager {
    fn default() -> Self {
        GlobalSessionManager::with_limits(DEFAULT_CAPACITY, DEFAULT_IDLE_TTL)
    }
}

impl GlobalSessionManager {
    pub fn new() -> Self {
        GlobalSessionManager::default()
    }

    pub fn with_limits(capacity: usize, idle_ttl: Duration) -> Self {
        GlobalSessionManager {
            workspaces: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
            idle_ttl,
        }
    }

    fn workspaces(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.workspaces.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Stores `workspace` unless another request registered one for the same
    /// id first; returns whichever is kept.
    pub fn insert(&self, session_id: String, workspace: Workspace) -> Workspace {
        let mut workspaces = self.workspaces();
        if let Some(slot) = workspaces.get_mut(&session_id) {
            slot.last_used = Instant::now();
            return slot.workspace.clone();
        }

        let idle_ttl = self.idle_ttl;
        let before = workspaces.len();
        workspaces.retain(|_, slot| slot.last_used.elapsed() < idle_ttl);
        if workspaces.len() < before {
            info!("Dropped {} idle workspace(s)", before - workspaces.len());
        }
        if workspaces.len() >= self.capacity {
            let oldest = workspaces
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                workspaces.remove(&oldest);
                info!("Workspace limit reached; dropped {}", oldest);
            }
        }

        workspaces.insert(
            session_id.clone(),
            Slot {
                workspace: workspace.clone(),
                last_used: Instant::now(),
            },
        );
        info!("Workspace {} ready ({} open)", session_id, workspaces.len());
        workspace
    }

    pub fn get(&self, session_id: &str) -> Option<Workspace> {
        let mut workspaces = self.workspaces();
        let slot = workspaces.get_mut(session_id)?;
        slot.last_used = Instant::now();
        Some(slot.workspace.clone())
    }

    pub fn remove(&self, session_id: &str) -> Option<Workspace> {
        self.workspaces().remove(session_id).map(|slot| slot.workspace)
    }

    pub fn len(&self) -> usize {
        self.workspaces().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces().is_empty()
    }
}
