pub mod auth_service;
pub mod chat_service;
pub mod gateway;
pub mod ingestion_service;
pub mod obe_service;
pub mod upload_service;
