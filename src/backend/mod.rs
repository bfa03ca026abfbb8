//! External collaborators: the auth provider and the data store.
//!
//! # Data Flow
//! ```text
//! Handlers
//!     → AuthProvider (sign in/up, user lookup and update, reset mail)
//!     → DataStore    (ideas and waitlist signups, scoped by owner)
//!
//! Implementations:
//!     http_auth.rs / rest_store.rs  : GoTrue + PostgREST over HTTP
//!     memory_auth.rs / memory_store.rs : process-local, for dev and tests
//! ```
//!
//! # Design Decisions
//! - Handlers only see the traits; `from_config` picks the implementation
//! - Provider errors are typed, so handlers never match on message text
//! - Owner-scoped store calls always filter out soft-deleted rows

pub mod http_auth;
pub mod memory_auth;
pub mod memory_store;
pub mod rest_store;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::{BackendConfig, BackendKind};

pub use http_auth::HttpAuthProvider;
pub use memory_auth::MemoryAuthProvider;
pub use memory_store::MemoryStore;
pub use rest_store::RestStore;
pub use types::{
    Idea, IdeaFields, IdeaStatus, NewAccount, NewSignup, Session, SignIn, SignUp, Signup,
    SignupMetadata, User, UserUpdate,
};

/// Errors reported by the auth provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("user already registered")]
    AlreadyRegistered,

    #[error("token is invalid or has expired")]
    InvalidToken,

    #[error("user not found")]
    NotFound,

    #[error("auth provider rejected the request: {0}")]
    Rejected(String),

    #[error("auth provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors reported by the data store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was hit (slug, or email+source for signups).
    #[error("conflicting row already exists")]
    Conflict,

    #[error("data store rejected the request: {0}")]
    Rejected(String),

    #[error("data store unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Account and session operations, delegated to the backend service.
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, ProviderError>;

    async fn sign_up(&self, account: NewAccount) -> Result<SignUp, ProviderError>;

    /// Resolve an access token to its user.
    async fn get_user(&self, access_token: &str) -> Result<User, ProviderError>;

    async fn update_user(&self, access_token: &str, update: UserUpdate) -> Result<User, ProviderError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError>;

    async fn send_password_reset(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), ProviderError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError>;
}

/// Idea and signup persistence.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    /// Non-deleted ideas of `owner`, newest first.
    async fn list_ideas(&self, owner: &str) -> Result<Vec<Idea>, StoreError>;

    async fn get_idea(&self, owner: &str, id: Uuid) -> Result<Option<Idea>, StoreError>;

    /// Non-deleted idea with `slug`, any owner.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Idea>, StoreError>;

    /// Non-deleted live or paused ideas of `owner`.
    async fn count_active_ideas(&self, owner: &str) -> Result<usize, StoreError>;

    async fn insert_idea(&self, owner: &str, fields: IdeaFields) -> Result<Idea, StoreError>;

    /// Overwrite the fields of a non-deleted idea. `None` when nothing matched.
    async fn update_idea(
        &self,
        owner: &str,
        id: Uuid,
        fields: IdeaFields,
    ) -> Result<Option<Idea>, StoreError>;

    /// Stamp `deleted_at`. Deleting a missing or foreign idea is not an error.
    async fn soft_delete_idea(&self, owner: &str, id: Uuid) -> Result<(), StoreError>;

    async fn add_signup(&self, signup: NewSignup) -> Result<Signup, StoreError>;

    /// Every signup, newest first.
    async fn list_signups(&self) -> Result<Vec<Signup>, StoreError>;
}

/// Collaborators selected by configuration.
pub struct Backends {
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn DataStore>,
}

impl Backends {
    pub fn from_config(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        match config.kind {
            BackendKind::Memory => {
                tracing::warn!("Using in-memory auth and storage; data is lost on restart");
                Ok(Self {
                    auth: Arc::new(MemoryAuthProvider::new()),
                    store: Arc::new(MemoryStore::new()),
                })
            }
            BackendKind::Http => {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(config.timeout_secs))
                    .build()?;
                tracing::info!(url = %config.url, "Using HTTP backend");
                Ok(Self {
                    auth: Arc::new(HttpAuthProvider::new(client.clone(), config)),
                    store: Arc::new(RestStore::new(client, config)),
                })
            }
        }
    }
}
