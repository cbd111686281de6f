use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use models::session::{self, NewSession};
use models::user;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::{ClientInfo, SessionId};
use crate::errors::{AuthFailure, ServiceError};

const INVALID: ServiceError = ServiceError::Unauthenticated(AuthFailure::InvalidSession);

/// Creates, validates and revokes sessions.
///
/// The `*_in` variants run on a caller-supplied connection or transaction so
/// they can share a unit of work with other operations; the plain variants
/// open and commit their own transaction.
#[derive(Clone)]
pub struct SessionManager {
    db: DatabaseConnection,
    idle_timeout: Duration,
}

impl SessionManager {
    pub fn new(db: DatabaseConnection, idle_timeout: Duration) -> Self { Self { db, idle_timeout } }

    pub fn idle_timeout(&self) -> Duration { self.idle_timeout }

    /// Mint a session for `username`, superseding every earlier one.
    ///
    /// The user row is locked first, so two concurrent logins for the same
    /// user queue up and exactly one session stays valid.
    #[instrument(skip(self, conn, client), fields(ip = %client.ip))]
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        username: &str,
        client: &ClientInfo,
    ) -> Result<SessionId, ServiceError> {
        user::find_for_update(conn, username).await?.ok_or(ServiceError::NotFound)?;
        let superseded = session::invalidate_for_user(conn, username).await?;

        let id = SessionId::generate();
        session::insert(
            conn,
            NewSession {
                id: id.as_str(),
                username,
                ip: &client.ip,
                user_agent: client.user_agent.as_deref(),
                now: Utc::now(),
            },
        )
        .await?;
        debug!(session = id.prefix(), superseded, "session created");
        Ok(id)
    }

    pub async fn create(&self, username: &str, client: &ClientInfo) -> Result<SessionId, ServiceError> {
        let txn = self.db.begin().await?;
        let id = self.create_in(&txn, username, client).await?;
        txn.commit().await?;
        Ok(id)
    }

    /// Resolve a token to its user and refresh `last_used`.
    ///
    /// Unknown, revoked and idle-expired sessions are all `InvalidSession`.
    /// The row is read under an exclusive lock and the refresh is a
    /// conditional update on the same freshness bound, so an expired session
    /// cannot be revived by a concurrent request.
    #[instrument(skip(self, conn, token))]
    pub async fn validate_and_touch_in<C: ConnectionTrait>(&self, conn: &C, token: &str) -> Result<String, ServiceError> {
        let Some(id) = SessionId::parse(token) else {
            debug!("malformed session token");
            return Err(INVALID);
        };
        let now = Utc::now();
        let cutoff = now - self.idle_timeout;

        let Some(row) = session::find_for_update(conn, id.as_str()).await? else {
            debug!(session = id.prefix(), "unknown session");
            return Err(INVALID);
        };
        if !row.valid {
            debug!(session = id.prefix(), "session was invalidated");
            return Err(INVALID);
        }
        if row.last_used < cutoff {
            let idle_secs = (now - row.last_used.with_timezone(&Utc)).num_seconds();
            debug!(session = id.prefix(), idle_secs, "session idle past timeout");
            return Err(INVALID);
        }
        if !session::touch_if_fresh(conn, id.as_str(), now, cutoff).await? {
            warn!(session = id.prefix(), "session expired while being touched");
            return Err(INVALID);
        }
        Ok(row.username)
    }

    pub async fn validate_and_touch(&self, token: &str) -> Result<String, ServiceError> {
        let txn = self.db.begin().await?;
        let username = self.validate_and_touch_in(&txn, token).await?;
        txn.commit().await?;
        Ok(username)
    }

    /// Revoke one session. Unknown or malformed tokens are not an error.
    #[instrument(skip(self, token))]
    pub async fn invalidate(&self, token: &str) -> Result<(), ServiceError> {
        let Some(id) = SessionId::parse(token) else { return Ok(()) };
        let n = session::invalidate(&self.db, id.as_str()).await?;
        debug!(session = id.prefix(), revoked = n, "session invalidated");
        Ok(())
    }

    /// Delete sessions that can never authenticate again.
    pub async fn purge_stale(&self) -> Result<u64, ServiceError> {
        let cutoff = Utc::now() - self.idle_timeout;
        Ok(session::purge_stale(&self.db, cutoff).await?)
    }

    /// Run [`purge_stale`](Self::purge_stale) every `every` until the runtime
    /// shuts down. Failures are logged and retried on the next tick.
    pub fn spawn_purge_task(self, every: StdDuration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.purge_stale().await {
                    Ok(0) => {}
                    Ok(n) => info!(purged = n, "stale sessions purged"),
                    Err(e) => warn!(error = %e, "session purge failed"),
                }
            }
        })
    }
}
