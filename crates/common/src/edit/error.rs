use crate::loader::LoaderError;
use crate::reflect::ReflectError;
use crate::store::{DocumentError, WriteError};
use crate::token::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("transaction token failed verification")]
    TamperedToken,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl EditError {
    /// Whether the failure is on our side rather than the caller's.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            EditError::Io(_) | EditError::Document(_) | EditError::Internal(_)
        )
    }
}

impl From<ReflectError> for EditError {
    fn from(err: ReflectError) -> Self {
        EditError::Internal(err.to_string())
    }
}

impl From<LoaderError> for EditError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::NotFound(path) => EditError::NotFound(path.to_string()),
            LoaderError::Io { source, .. } => EditError::Io(source),
            LoaderError::Document(e) => EditError::Document(e),
            other => EditError::Internal(other.to_string()),
        }
    }
}

impl From<TokenError> for EditError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Unverified => EditError::TamperedToken,
            other => EditError::Internal(other.to_string()),
        }
    }
}

impl EditError {
    /// Write failures outside of an update's per-key reporting.
    pub(crate) fn from_write(key: &str, err: WriteError) -> Self {
        match err {
            WriteError::Io(e) => EditError::Io(e),
            other => EditError::Validation(format!("{}: {}", key, other)),
        }
    }
}
