use std::sync::{Arc, Mutex, MutexGuard};
use log::{error, info, warn};
use crate::models::chat_session::{ChatSession, ValidationError};
use crate::models::message::display_time_now;
use crate::models::rag_api::{HistoryResponse, QueryRequest, QueryResponse};
use crate::services::gateway::{Gateway, GatewayError};

/// Assistant text shown in place of an answer when a query fails.
pub const QUERY_FAILURE_NOTICE: &str = "Error: failed to get answer from server.";

/// How a submitted query settled.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Answered,
    Failed(GatewayError),
}

/// Drives one conversation with the RAG backend.
///
/// Clones share the same session. The lock is only held between awaits, so
/// each state change is a single step and the gateway call runs unlocked.
#[derive(Clone)]
pub struct QuerySession {
    gateway: Arc<Gateway>,
    chat: Arc<Mutex<ChatSession>>,
}

impl QuerySession {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        QuerySession {
            gateway,
            chat: Arc::new(Mutex::new(ChatSession::new())),
        }
    }

    /// Creates the session and seeds it with the user's stored history.
    pub async fn start(gateway: Arc<Gateway>) -> Self {
        let session = QuerySession::new(gateway);
        session.hydrate().await;
        session
    }

    fn chat(&self) -> MutexGuard<'_, ChatSession> {
        self.chat.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn snapshot(&self) -> ChatSession {
        self.chat().clone()
    }

    async fn hydrate(&self) {
        let history = match self.gateway.get_json::<HistoryResponse>("/rag/history").await {
            Ok(history) => history,
            Err(e) => {
                warn!("Failed to load chat history: {}", e);
                return;
            }
        };
        let mut chat = self.chat();
        if chat.hydrate(&history.queries) {
            info!("Loaded {} earlier queries into the conversation", history.queries.len());
        } else {
            warn!("Conversation already active; skipping stored history");
        }
    }

    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, ValidationError> {
        self.submit_with_subject(text, None).await
    }

    /// Sends `text` as the next query, optionally scoped to a subject.
    ///
    /// Refused without side effects when the text is blank or another query is
    /// still outstanding. Once accepted, the exchange runs on its own task, so
    /// the session settles back to idle even if this future is dropped.
    pub async fn submit_with_subject(
        &self,
        text: &str,
        subject: Option<&str>,
    ) -> Result<SubmitOutcome, ValidationError> {
        let session_id = {
            let mut chat = self.chat();
            chat.begin_query(text, &display_time_now())?;
            chat.session_id().map(str::to_string)
        };

        info!("Submitting query (session: {})", session_id.as_deref().unwrap_or("new"));
        let request = QueryRequest {
            user_query: text.to_string(),
            subject: subject.map(str::to_string),
            session_id,
        };
        let session = self.clone();
        match tokio::spawn(async move { session.exchange(request).await }).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Query task ended abnormally: {}", e);
                let failure = GatewayError::Network(e.to_string());
                let mut chat = self.chat();
                if chat.is_awaiting_response() {
                    chat.record_failure(QUERY_FAILURE_NOTICE, &failure.to_string(), &display_time_now());
                }
                Ok(SubmitOutcome::Failed(failure))
            }
        }
    }

    async fn exchange(&self, request: QueryRequest) -> SubmitOutcome {
        let result = self
            .gateway
            .post_json::<_, QueryResponse>("/rag/query", &request)
            .await;

        let mut chat = self.chat();
        match result {
            Ok(response) => {
                chat.record_answer(
                    response.answer_text(),
                    response.citations(),
                    response.session_id(),
                    &display_time_now(),
                );
                SubmitOutcome::Answered
            }
            Err(e) => {
                error!("RAG query failed: {}", e);
                chat.record_failure(QUERY_FAILURE_NOTICE, &e.to_string(), &display_time_now());
                SubmitOutcome::Failed(e)
            }
        }
    }
}
