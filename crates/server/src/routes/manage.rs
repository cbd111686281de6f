use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use service::authorizer::ManageRequest;
use service::ServiceError;

use crate::errors::ApiError;
use crate::observability::{LEDGER_OPERATIONS_TOTAL, SESSIONS_REJECTED_TOTAL};
use crate::routes::plain_text;
use crate::state::ServerState;

/// `/manage?action=deposit|withdraw|balance|close&amount=N`, session cookie required.
pub async fn manage(
    State(state): State<ServerState>,
    jar: CookieJar,
    Query(request): Query<ManageRequest>,
) -> Result<Response, ApiError> {
    let token = jar.get(&state.http.cookie_name).map(|c| c.value().to_owned());
    match state.services.authorizer.manage(token.as_deref(), &request).await {
        Ok(outcome) => {
            LEDGER_OPERATIONS_TOTAL.with_label_values(&[outcome.action()]).inc();
            Ok(plain_text(StatusCode::OK, outcome.to_string()))
        }
        Err(e) => {
            if matches!(e, ServiceError::Unauthenticated(_)) {
                SESSIONS_REJECTED_TOTAL.inc();
            }
            Err(state.http.error(e))
        }
    }
}
