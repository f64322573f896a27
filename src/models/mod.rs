pub mod auth_session;
pub mod chat_session;
pub mod field_alias;
pub mod ingestion_task;
pub mod message;
pub mod obe;
pub mod rag_api;
