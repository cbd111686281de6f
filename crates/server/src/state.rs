use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use configs::AppConfig;
use sea_orm::DatabaseConnection;
use service::{ServiceContext, ServiceError, ServiceSettings};

use crate::errors::{ApiError, ErrorStyle};

/// Cookie and response settings for the HTTP layer.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cookie_name: String,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub errors: ErrorStyle,
}

impl HttpSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            cookie_name: cfg.session.cookie_name.clone(),
            cookie_domain: cfg.session.cookie_domain.clone(),
            cookie_secure: cfg.session.cookie_secure,
            errors: ErrorStyle {
                legacy_status_codes: cfg.server.legacy_status_codes,
                redact_internal_errors: cfg.server.redact_internal_errors,
            },
        }
    }

    pub fn error(&self, error: ServiceError) -> ApiError { ApiError::new(error, self.errors) }

    /// HttpOnly, SameSite=Strict, Path=/ session cookie.
    pub fn session_cookie(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.cookie_name.clone(), value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.cookie_secure);
        cookie.set_same_site(SameSite::Strict);
        if let Some(domain) = &self.cookie_domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub services: ServiceContext,
    pub http: Arc<HttpSettings>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, cfg: &AppConfig) -> Self {
        Self {
            services: ServiceContext::new(db, ServiceSettings::from_config(cfg)),
            http: Arc::new(HttpSettings::from_config(cfg)),
        }
    }
}
