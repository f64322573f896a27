pub mod config;
pub mod global_session_manager;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod token_store;

pub use global_session_manager::{GlobalSessionManager, Workspace};
pub use services::gateway::Gateway;
