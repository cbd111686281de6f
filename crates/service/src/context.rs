use std::time::Duration as StdDuration;

use chrono::Duration;
use configs::AppConfig;
use sea_orm::DatabaseConnection;

use crate::auth::AuthService;
use crate::authorizer::Authorizer;
use crate::session::SessionManager;

/// Tunables the services need from the application config.
#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub idle_timeout: Duration,
    pub request_timeout: StdDuration,
}

impl ServiceSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let idle_secs = i64::try_from(cfg.session.idle_timeout_secs).unwrap_or(i64::MAX);
        Self {
            idle_timeout: Duration::try_seconds(idle_secs).unwrap_or(Duration::MAX),
            request_timeout: StdDuration::from_secs(cfg.server.request_timeout_secs),
        }
    }
}

/// Every service wired to one connection pool.
#[derive(Clone)]
pub struct ServiceContext {
    pub auth: AuthService,
    pub sessions: SessionManager,
    pub authorizer: Authorizer,
}

impl ServiceContext {
    pub fn new(db: DatabaseConnection, settings: ServiceSettings) -> Self {
        let sessions = SessionManager::new(db.clone(), settings.idle_timeout);
        Self {
            auth: AuthService::new(db.clone(), sessions.clone(), settings.request_timeout),
            authorizer: Authorizer::new(db, sessions.clone(), settings.request_timeout),
            sessions,
        }
    }
}
