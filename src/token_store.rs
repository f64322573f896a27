use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// On-disk shape of the durable token slot.
#[derive(Serialize, Deserialize)]
pub struct TokenCache {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("Token cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Token cache is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable storage for the bearer token. Absence of a token means the user is
/// unauthenticated.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, TokenStoreError>;
    fn save(&self, token: &str) -> Result<(), TokenStoreError>;
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// JSON token cache on disk; survives restarts of the console.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTokenStore { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let cache: TokenCache = serde_json::from_str(&content)?;
        if cache.access_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(cache.access_token))
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        let cache = TokenCache {
            access_token: token.to_string(),
            token_type: Some("bearer".to_string()),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&cache)?)?;
        info!("Stored access token in {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed token cache {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Token cache {} already absent", self.path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

// A process-local token slot, used by tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        MemoryTokenStore::default()
    }

    pub fn with_token(token: &str) -> Self {
        MemoryTokenStore {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.token.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(|p| p.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }
}
