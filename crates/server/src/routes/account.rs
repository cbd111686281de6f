use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use service::auth::domain::{LoginInput, RegisterInput};
use service::{AuthFailure, ServiceError};

use crate::client::ClientMeta;
use crate::errors::ApiError;
use crate::observability::LOGINS_TOTAL;
use crate::routes::plain_text;
use crate::state::ServerState;

/// `?user=U&pass=P`
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsQuery {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
}

impl CredentialsQuery {
    fn into_parts(self) -> (String, String) {
        (self.user.unwrap_or_default(), self.pass.unwrap_or_default())
    }
}

pub async fn index() -> Response {
    plain_text(StatusCode::OK, "Welcome to the bank app. Use /register, /login, /manage, /logout")
}

pub async fn register(
    State(state): State<ServerState>,
    Query(q): Query<CredentialsQuery>,
) -> Result<Response, ApiError> {
    let (username, password) = q.into_parts();
    state
        .services
        .auth
        .register(RegisterInput { username: username.clone(), password })
        .await
        .map_err(|e| state.http.error(e))?;
    Ok(plain_text(StatusCode::OK, format!("Account created for user {username}")))
}

pub async fn login(
    State(state): State<ServerState>,
    ClientMeta(client): ClientMeta,
    jar: CookieJar,
    Query(q): Query<CredentialsQuery>,
) -> Result<(CookieJar, Response), ApiError> {
    let (username, password) = q.into_parts();
    let result = state.services.auth.login(LoginInput { username, password, client }).await;
    let session = match result {
        Ok(session) => session,
        Err(e) => {
            if matches!(e, ServiceError::Unauthenticated(AuthFailure::BadCredentials)) {
                LOGINS_TOTAL.with_label_values(&["rejected"]).inc();
            }
            return Err(state.http.error(e));
        }
    };
    LOGINS_TOTAL.with_label_values(&["ok"]).inc();

    let body = format!("Login successful for {}", session.username);
    let jar = jar.add(state.http.session_cookie(session.session_id.into_string()));
    Ok((jar, plain_text(StatusCode::OK, body)))
}

/// Revoke the presented session, if any, and clear the cookie either way.
pub async fn logout(State(state): State<ServerState>, jar: CookieJar) -> Result<(CookieJar, Response), ApiError> {
    if let Some(cookie) = jar.get(&state.http.cookie_name) {
        state.services.auth.logout(cookie.value()).await.map_err(|e| state.http.error(e))?;
    }
    let jar = jar.remove(state.http.session_cookie(String::new()));
    Ok((jar, plain_text(StatusCode::OK, "Logged out")))
}
