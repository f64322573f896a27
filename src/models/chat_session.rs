use serde::Serialize;
use crate::models::message::{Citation, Message};
use crate::models::rag_api::HistoryEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryState {
    Idle,
    AwaitingResponse,
}

/// Reasons a submission is refused before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Query text is empty")]
    EmptyQuery,

    #[error("A query is already awaiting a response")]
    QueryInFlight,
}

/// One conversation with the RAG backend.
///
/// The message log only ever grows: no edits, no reordering, no deletion.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    session_id: Option<String>,
    messages: Vec<Message>,
    state: QueryState,
    last_error: Option<String>,
}

impl Default for ChatSession {
    fn default() -> Self {
        ChatSession {
            session_id: None,
            messages: Vec::new(),
            state: QueryState::Idle,
            last_error: None,
        }
    }
}

impl ChatSession {
    pub fn new() -> Self {
        ChatSession::default()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.state == QueryState::AwaitingResponse
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Validates `text`, appends the user message and enters `AwaitingResponse`.
    pub fn begin_query(&mut self, text: &str, timestamp: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        if self.is_awaiting_response() {
            return Err(ValidationError::QueryInFlight);
        }
        self.messages.push(Message::user(text, timestamp));
        self.state = QueryState::AwaitingResponse;
        Ok(())
    }

    pub fn record_answer(
        &mut self,
        answer: &str,
        sources: Vec<Citation>,
        session_id: Option<&str>,
        timestamp: &str,
    ) {
        self.messages.push(Message::assistant(answer, timestamp, sources));
        self.adopt_session_id(session_id);
        self.last_error = None;
        self.state = QueryState::Idle;
    }

    /// Appends the fixed failure notice as an assistant message.
    pub fn record_failure(&mut self, notice: &str, reason: &str, timestamp: &str) {
        self.messages.push(Message::assistant(notice, timestamp, Vec::new()));
        self.last_error = Some(reason.to_string());
        self.state = QueryState::Idle;
    }

    /// Keeps the first session id ever seen; later ones are ignored.
    pub fn adopt_session_id(&mut self, session_id: Option<&str>) -> bool {
        if self.session_id.is_some() {
            return false;
        }
        match session_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => {
                self.session_id = Some(id.to_string());
                true
            }
            None => false,
        }
    }

    /// Seeds the log from stored history. Only an untouched session accepts
    /// history, so hydration never interleaves with live messages.
    pub fn hydrate(&mut self, entries: &[HistoryEntry]) -> bool {
        if !self.messages.is_empty() || self.is_awaiting_response() {
            return false;
        }
        for entry in entries {
            self.messages.extend(entry.to_messages());
        }
        let carried = entries.iter().find_map(HistoryEntry::session_id);
        self.adopt_session_id(carried);
        true
    }
}
