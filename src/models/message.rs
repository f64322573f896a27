use std::fmt;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::models::field_alias::{first_number, first_string};

const DEFAULT_CITATION_KIND: &str = "Document";

/// A supporting document surfaced next to an assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl Citation {
    pub fn new(kind: &str, name: &str, page: Option<u32>) -> Self {
        Citation {
            kind: kind.to_string(),
            name: name.to_string(),
            page,
        }
    }

    /// Maps one backend source record onto a citation. The dashboard sends
    /// `type/name/page`, the RAG service sends `document_name/page_no`.
    pub fn from_wire(raw: &Value) -> Option<Citation> {
        if !raw.is_object() {
            return None;
        }
        let name = first_string(raw, &["name", "document_name", "title", "source"])?;
        let kind = first_string(raw, &["type", "document_type", "source_type"])
            .unwrap_or_else(|| DEFAULT_CITATION_KIND.to_string());
        let page = first_number(raw, &["page", "page_no", "page_number"])
            .filter(|p| *p >= 0.0 && p.fract() == 0.0)
            .map(|p| p as u32);
        Some(Citation { kind, name, page })
    }

    pub fn list_from_wire(raw: &[Value]) -> Vec<Citation> {
        raw.iter().filter_map(Citation::from_wire).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a conversation. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    User {
        content: String,
        timestamp: String,
    },
    Assistant {
        content: String,
        timestamp: String,
        #[serde(default)]
        sources: Vec<Citation>,
    },
}

impl Message {
    pub fn user(content: &str, timestamp: &str) -> Self {
        Message::User {
            content: content.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    pub fn assistant(content: &str, timestamp: &str, sources: Vec<Citation>) -> Self {
        Message::Assistant {
            content: content.to_string(),
            timestamp: timestamp.to_string(),
            sources,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::User { content, .. } | Message::Assistant { content, .. } => content,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            Message::User { timestamp, .. } | Message::Assistant { timestamp, .. } => timestamp,
        }
    }

    pub fn sources(&self) -> &[Citation] {
        match self {
            Message::User { .. } => &[],
            Message::Assistant { sources, .. } => sources,
        }
    }
}

/// Hour and minute in the style the dashboard shows next to each message.
pub fn display_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format("%I:%M %p").to_string()
}

pub fn display_time_now() -> String {
    display_time(&Local::now())
}

/// Formats a history timestamp. The backend emits ISO-8601, usually without an
/// offset (UTC). Returns an empty string when the value is absent or unreadable.
pub fn display_history_time(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return String::new();
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return display_time(&parsed.with_timezone(&Local));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => display_time(&Utc.from_utc_datetime(&naive).with_timezone(&Local)),
        Err(_) => String::new(),
    }
}
