use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::models::message::{display_history_time, Citation, Message};

/// Body of `POST /rag/query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub user_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Answer returned by `POST /rag/query`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<Value>>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl QueryResponse {
    pub fn answer_text(&self) -> &str {
        self.answer.as_deref().unwrap_or_default()
    }

    pub fn citations(&self) -> Vec<Citation> {
        self.sources
            .as_deref()
            .map(Citation::list_from_wire)
            .unwrap_or_default()
    }

    pub fn session_id(&self) -> Option<&str> {
        non_empty(self.session_id.as_deref())
    }
}

/// `GET /rag/history`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub queries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<Value>>,
}

impl HistoryEntry {
    /// The user/assistant pair this entry stands for, in that order.
    pub fn to_messages(&self) -> [Message; 2] {
        let timestamp = display_history_time(self.timestamp.as_deref());
        let sources = self
            .sources
            .as_deref()
            .map(Citation::list_from_wire)
            .unwrap_or_default();
        [
            Message::user(self.query.as_deref().unwrap_or_default(), &timestamp),
            Message::assistant(self.response.as_deref().unwrap_or_default(), &timestamp, sources),
        ]
    }

    pub fn session_id(&self) -> Option<&str> {
        non_empty(self.session_id.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
