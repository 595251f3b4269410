use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use thiserror::Error;

use crate::allocator::{CodeAllocator, CodeStrategy};
use crate::config::Config;
use crate::database::Store;
use crate::error::{AppError, CodeError};
use crate::hash::KeyedHasher;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("short code setup failed: {0}")]
    Codes(#[from] CodeError),
    #[error("store setup failed: {0}")]
    Store(#[from] AppError),
    #[error("session key rejected: {0}")]
    SessionKey(String),
}

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// In-memory URL and user tables
    pub store: Store,
    /// Code allocator, holding the precomputed hash key schedule
    pub codes: Arc<CodeAllocator>,
    /// How new user ids and URL codes are derived
    pub strategy: CodeStrategy,
    /// Signing key for the session cookie
    pub key: Key,
    /// Guard for `/urls.json`
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Builds the state once at startup. The hash key schedule is computed
    /// here and never changes afterwards.
    pub fn new(config: &Config) -> Result<Self, StartupError> {
        let hasher = KeyedHasher::new(config.code_length, config.hash_key_count)?;
        let key = match &config.session_secret {
            Some(secret) => Key::try_from(secret.as_bytes())
                .map_err(|e| StartupError::SessionKey(e.to_string()))?,
            None => Key::generate(),
        };

        Ok(Self {
            store: Store::in_memory()?,
            codes: Arc::new(CodeAllocator::new(hasher, config.max_attempts)),
            strategy: config.strategy,
            key,
            admin_token: config.admin_token.as_deref().map(Arc::from),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}
