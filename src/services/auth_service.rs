use std::sync::{Arc, RwLock};
use log::{error, info, warn};
use crate::models::auth_session::{AuthSession, LoginRequest, TokenGrant, UserProfile};
use crate::services::gateway::{CredentialProvider, Gateway, GatewayError};
use crate::token_store::{TokenStore, TokenStoreError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Could not persist the access token: {0}")]
    Storage(#[from] TokenStoreError),

    #[error("Signed in, but the user profile could not be loaded")]
    ProfileUnavailable,
}

/// Durable token plus the in-memory picture of who is signed in.
pub struct AuthContext {
    store: Arc<dyn TokenStore>,
    session: RwLock<AuthSession>,
}

impl AuthContext {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        AuthContext {
            store,
            session: RwLock::new(AuthSession {
                user: None,
                loading: true,
            }),
        }
    }

    pub fn session(&self) -> AuthSession {
        self.session.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn store_token(&self, token: &str) -> Result<(), TokenStoreError> {
        self.store.save(token)
    }

    fn set_loading(&self, loading: bool) {
        self.session.write().unwrap_or_else(|p| p.into_inner()).loading = loading;
    }

    fn set_user(&self, user: Option<UserProfile>) {
        self.session.write().unwrap_or_else(|p| p.into_inner()).user = user;
    }
}

impl CredentialProvider for AuthContext {
    fn bearer_token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to read token cache: {}", e);
                None
            }
        }
    }

    fn invalidate(&self) {
        if let Err(e) = self.store.clear() {
            error!("Failed to clear token cache: {}", e);
        }
        self.set_user(None);
    }
}

/// Login, logout and profile refresh over the gateway.
#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<Gateway>,
    context: Arc<AuthContext>,
}

impl AuthService {
    pub fn new(gateway: Arc<Gateway>, context: Arc<AuthContext>) -> Self {
        AuthService { gateway, context }
    }

    pub fn session(&self) -> AuthSession {
        self.context.session()
    }

    /// Reloads the profile from `/auth/me`. Any failure leaves the user
    /// signed out.
    pub async fn refresh(&self) -> Option<UserProfile> {
        self.context.set_loading(true);
        let user = match self.gateway.get_json::<UserProfile>("/auth/me").await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Could not load the current user: {}", e);
                None
            }
        };
        self.context.set_user(user.clone());
        self.context.set_loading(false);
        user
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let grant: TokenGrant = self.gateway.post_json("/auth/login", &request).await?;
        self.context.store_token(&grant.access_token)?;
        info!("Signed in as {}", request.email);

        self.refresh().await.ok_or(AuthError::ProfileUnavailable)
    }

    pub fn logout(&self) {
        info!("Signing out");
        self.context.invalidate();
        self.gateway.redirect_to_login();
    }
}
