use tracing::info;
use uuid::Uuid;

use crate::{
    auth::models::{Identity, RegisterRequest, UserRecord},
    store::backend::StoreError,
    store::session_store::SessionStore,
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Wrong username or password")]
    InvalidCredentials,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Username has already been taken")]
    UsernameTaken,

    #[error("Email has already been taken")]
    EmailTaken,

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Store-backed mock registry. Validation order matches the original
/// sign-up flow: password match, then username, then email uniqueness.
#[derive(Clone)]
pub struct UserRegistry {
    store: SessionStore,
}

impl UserRegistry {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    pub fn register(&self, request: RegisterRequest) -> Result<UserRecord, AuthError> {
        if request.password != request.repeat_password {
            return Err(AuthError::PasswordMismatch);
        }

        let mut users = self.store.load_users().unwrap_or_default();
        if users.iter().any(|u| u.username == request.username) {
            return Err(AuthError::UsernameTaken);
        }
        if users.iter().any(|u| u.email == request.email) {
            return Err(AuthError::EmailTaken);
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            username: request.username,
            password: request.password,
            email: request.email,
        };
        users.push(user.clone());
        self.store.save_users(&users)?;

        info!("Registered local user: {}", user.username);
        Ok(user)
    }

    /// Validates credentials and persists the display identity. Minting the
    /// upstream token afterwards is the caller's move, via `TokenManager`.
    pub fn login(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let users = self.store.load_users().unwrap_or_default();
        let Some(user) = users
            .iter()
            .find(|u| u.username == username && u.password == password)
        else {
            return Err(AuthError::InvalidCredentials);
        };

        let identity = Identity::from_record(user);
        self.store.save_identity(&identity)?;

        info!("Logged in local user: {}", identity.username);
        Ok(identity)
    }

    /// Drops the identity and the upstream token, the registry itself stays.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear_identity()?;
        self.store.clear_token()?;

        Ok(())
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.store.load_identity()
    }
}
