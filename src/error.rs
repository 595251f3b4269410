//! Error types
//!
//! [`CodeError`] covers short code generation and allocation. [`AppError`] is
//! what HTTP handlers return; it converts every failure into a response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("no free short code after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error("unsupported code length: {0}")]
    InvalidLength(usize),
    #[error("hash key count must be at least 1")]
    InvalidKeyCount,
    #[error("key schedule search found {found} of {wanted} keys")]
    KeySchedule { wanted: usize, found: usize },
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] redb::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Code(#[from] CodeError),
}

macro_rules! impl_from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AppError {
                fn from(err: $ty) -> Self {
                    Self::Database(redb::Error::from(err))
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Code(CodeError::Exhausted { attempts }) => {
                tracing::warn!(attempts, "short code space exhausted");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Could not allocate a short code. Please try again.",
                )
                    .into_response()
            }
            err => {
                tracing::error!("internal error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
