use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use service::ServiceError;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::observability::STORAGE_UNAVAILABLE_TOTAL;
use crate::routes::plain_text;

/// How service errors are rendered.
#[derive(Debug, Clone, Copy)]
pub struct ErrorStyle {
    /// Answer 200 for every error; the body alone carries the outcome.
    pub legacy_status_codes: bool,
    pub redact_internal_errors: bool,
}

impl Default for ErrorStyle {
    fn default() -> Self {
        Self { legacy_status_codes: false, redact_internal_errors: true }
    }
}

/// A service error on its way out as a plain-text response.
#[derive(Debug)]
pub struct ApiError {
    error: ServiceError,
    style: ErrorStyle,
}

impl ApiError {
    pub fn new(error: ServiceError, style: ErrorStyle) -> Self { Self { error, style } }

    pub fn status(&self) -> StatusCode {
        if self.style.legacy_status_codes {
            return StatusCode::OK;
        }
        status_for(&self.error)
    }

    pub fn body(&self) -> String {
        match &self.error {
            ServiceError::Unexpected(_) if self.style.redact_internal_errors => {
                "Database error: internal error".to_string()
            }
            ServiceError::Unexpected(msg) => format!("Database error: {msg}"),
            ServiceError::StorageUnavailable(_) => format!("Database error: {}", self.error),
            other => format!("Error: {other}"),
        }
    }
}

pub fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Domain(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error.code();
        match &self.error {
            ServiceError::Unexpected(msg) => error!(code, error = %msg, "unexpected service error"),
            ServiceError::StorageUnavailable(detail) => {
                STORAGE_UNAVAILABLE_TOTAL.inc();
                warn!(code, detail = %detail, "storage unavailable");
            }
            other => debug!(code, error = %other, "request refused"),
        }

        let status = self.status();
        let mut resp = plain_text(status, self.body());
        if status == StatusCode::SERVICE_UNAVAILABLE {
            resp.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        resp
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error("cannot bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::ledger::{Amount, LedgerError};
    use service::AuthFailure;

    fn render(error: ServiceError, style: ErrorStyle) -> (StatusCode, String) {
        let e = ApiError::new(error, style);
        (e.status(), e.body())
    }

    #[test]
    fn statuses_follow_error_kind() {
        let s = ErrorStyle::default();
        let cases = [
            (ServiceError::validation("invalid action"), StatusCode::BAD_REQUEST),
            (ServiceError::Unauthenticated(AuthFailure::MissingToken), StatusCode::UNAUTHORIZED),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::Conflict("alice".into()), StatusCode::CONFLICT),
            (LedgerError::BalanceOverflow.into(), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::StorageUnavailable("pool timed out".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ServiceError::Unexpected("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, want) in cases {
            assert_eq!(render(err, s).0, want);
        }
    }

    #[test]
    fn bodies_keep_wire_text() {
        let s = ErrorStyle::default();
        assert_eq!(render(ServiceError::Conflict("bob".into()), s).1, "Error: user bob already exists");
        let funds = LedgerError::InsufficientFunds { balance: Amount::from_minor(7_050).unwrap() };
        assert_eq!(render(funds.into(), s).1, "Error: insufficient funds. balance=70");
        assert_eq!(
            render(ServiceError::StorageUnavailable("pool timed out".into()), s).1,
            "Database error: storage unavailable, try again later"
        );
    }

    #[test]
    fn unexpected_errors_are_redacted_by_default() {
        let err = || ServiceError::Unexpected("relation \"users\" does not exist".into());
        assert_eq!(render(err(), ErrorStyle::default()).1, "Database error: internal error");
        let open = ErrorStyle { redact_internal_errors: false, ..ErrorStyle::default() };
        assert!(render(err(), open).1.contains("relation"));
    }

    #[test]
    fn legacy_mode_always_answers_ok() {
        let legacy = ErrorStyle { legacy_status_codes: true, ..ErrorStyle::default() };
        let (status, body) = render(ServiceError::NotFound, legacy);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Error: user not found");
    }

    #[test]
    fn storage_errors_carry_retry_after() {
        let resp = ApiError::new(ServiceError::StorageUnavailable("x".into()), ErrorStyle::default()).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "1");
    }
}
