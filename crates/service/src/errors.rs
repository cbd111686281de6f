use std::fmt;

use models::errors::ModelError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::ledger::LedgerError;

/// Why a caller could not be authenticated. The display text is what the
/// client sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No session cookie was presented.
    MissingToken,
    /// Unknown, invalidated, idle-expired or malformed session.
    InvalidSession,
    /// Unknown user or wrong password; deliberately indistinguishable.
    BadCredentials,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AuthFailure::MissingToken => "not logged in",
            AuthFailure::InvalidSession => "session expired or invalid. Please log in again.",
            AuthFailure::BadCredentials => "invalid username or password",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed input the caller can fix.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(AuthFailure),
    #[error("user {0} already exists")]
    Conflict(String),
    #[error("user not found")]
    NotFound,
    /// Business-rule rejection; not a bug and not retryable as-is.
    #[error(transparent)]
    Domain(#[from] LedgerError),
    /// Transient storage failure; the detail is for logs only.
    #[error("storage unavailable, try again later")]
    StorageUnavailable(String),
    #[error("{0}")]
    Unexpected(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::Conflict(_) => 1002,
            ServiceError::NotFound => 1003,
            ServiceError::Unauthenticated(_) => 1004,
            ServiceError::Domain(_) => 1100,
            ServiceError::StorageUnavailable(_) => 1200,
            ServiceError::Unexpected(_) => 1900,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::StorageUnavailable(_))
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        match &e {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => ServiceError::StorageUnavailable(e.to_string()),
            _ => ServiceError::Unexpected(e.to_string()),
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            ModelError::Db(db) => db.into(),
        }
    }
}

pub(crate) fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_messages_match_wire_text() {
        assert_eq!(AuthFailure::MissingToken.to_string(), "not logged in");
        assert_eq!(
            AuthFailure::InvalidSession.to_string(),
            "session expired or invalid. Please log in again."
        );
        assert_eq!(AuthFailure::BadCredentials.to_string(), "invalid username or password");
    }

    #[test]
    fn pool_errors_are_retryable() {
        let err: ServiceError = DbErr::ConnectionAcquire(sea_orm::ConnAcquireErr::Timeout).into();
        assert!(err.is_retryable());
        assert_eq!(err.code(), 1200);

        let err: ServiceError = DbErr::Custom("boom".into()).into();
        assert!(!err.is_retryable());
        assert!(matches!(err, ServiceError::Unexpected(_)));
    }

    #[test]
    fn model_validation_stays_validation() {
        let err: ServiceError = ModelError::Validation("name required".into()).into();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "name required"));
    }
}
