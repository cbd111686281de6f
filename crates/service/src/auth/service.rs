use std::time::Duration;

use models::errors::ModelError;
use models::user;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, instrument, warn};

use super::domain::{AuthSession, LoginInput, RegisterInput};
use super::password::{self, Verdict};
use crate::errors::{is_unique_violation, AuthFailure, ServiceError};
use crate::session::SessionManager;
use crate::unit_of_work::{blocking, bounded};

const BAD_CREDENTIALS: ServiceError = ServiceError::Unauthenticated(AuthFailure::BadCredentials);

/// Registration, login and logout, independent of the web framework.
#[derive(Clone)]
pub struct AuthService {
    db: DatabaseConnection,
    sessions: SessionManager,
    request_timeout: Duration,
}

impl AuthService {
    pub fn new(db: DatabaseConnection, sessions: SessionManager, request_timeout: Duration) -> Self {
        Self { db, sessions, request_timeout }
    }

    /// Create an account with a hashed password and a zero balance. No
    /// session is opened.
    ///
    /// # Examples
    /// ```
    /// use migration::MigratorTrait;
    /// use models::db::{connect_with_config, sqlite_memory_config};
    /// use service::auth::domain::RegisterInput;
    /// use service::{ServiceContext, ServiceSettings};
    ///
    /// tokio_test::block_on(async {
    ///     let db = connect_with_config(&sqlite_memory_config()).await.unwrap();
    ///     migration::Migrator::up(&db, None).await.unwrap();
    ///     let settings = ServiceSettings {
    ///         idle_timeout: chrono::Duration::minutes(15),
    ///         request_timeout: std::time::Duration::from_secs(10),
    ///     };
    ///     let ctx = ServiceContext::new(db, settings);
    ///     let input = RegisterInput { username: "alice".into(), password: "secret".into() };
    ///     ctx.auth.register(input.clone()).await.unwrap();
    ///     assert!(ctx.auth.register(input).await.is_err());
    /// });
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<(), ServiceError> {
        require_credentials(&input.username, &input.password)?;
        user::validate_name(&input.username)?;

        let secret = input.password;
        let hash = blocking(move || password::hash_password(&secret)).await?;

        let username = input.username;
        bounded(self.request_timeout, async {
            let txn = self.db.begin().await?;
            if user::find(&txn, &username).await?.is_some() {
                return Err(ServiceError::Conflict(username.clone()));
            }
            match user::create(&txn, &username, &hash).await {
                Ok(_) => {}
                Err(ModelError::Db(e)) if is_unique_violation(&e) => {
                    return Err(ServiceError::Conflict(username.clone()));
                }
                Err(e) => return Err(e.into()),
            }
            txn.commit().await?;
            Ok::<_, ServiceError>(())
        })
        .await?;

        info!("user_registered");
        Ok(())
    }

    /// Check credentials and open a session, superseding any earlier one.
    ///
    /// Unknown users and wrong passwords are the same error. A legacy
    /// credential is rewritten as Argon2id in the same transaction that
    /// creates the session.
    #[instrument(skip(self, input), fields(username = %input.username, ip = %input.client.ip))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, ServiceError> {
        require_credentials(&input.username, &input.password)?;

        let Some(found) = user::find(&self.db, &input.username).await? else {
            info!("login_rejected");
            return Err(BAD_CREDENTIALS);
        };

        let stored = found.pass;
        let supplied = input.password;
        let verdict = blocking(move || password::verify_and_maybe_upgrade(&stored, &supplied)).await?;
        let upgrade = match verdict {
            Verdict::Rejected => {
                info!("login_rejected");
                return Err(BAD_CREDENTIALS);
            }
            Verdict::Accepted => None,
            Verdict::Upgrade(hash) => Some(hash),
        };

        let username = input.username;
        let client = input.client;
        let session_id = bounded(self.request_timeout, async {
            let txn = self.db.begin().await?;
            if let Some(hash) = &upgrade {
                if !user::update_password(&txn, &username, hash).await? {
                    return Err(BAD_CREDENTIALS);
                }
            }
            let id = match self.sessions.create_in(&txn, &username, &client).await {
                Err(ServiceError::NotFound) => {
                    warn!("account vanished during login");
                    return Err(BAD_CREDENTIALS);
                }
                other => other?,
            };
            txn.commit().await?;
            Ok::<_, ServiceError>(id)
        })
        .await?;

        info!(session = session_id.prefix(), credential_upgraded = upgrade.is_some(), "user_logged_in");
        Ok(AuthSession { username, session_id, credential_upgraded: upgrade.is_some() })
    }

    /// Revoke the session behind `token`, if any.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.sessions.invalidate(token).await
    }
}

fn require_credentials(username: &str, password: &str) -> Result<(), ServiceError> {
    if username.is_empty() || password.is_empty() {
        return Err(ServiceError::validation("must provide ?user=USER&pass=PASS"));
    }
    Ok(())
}
