use models::{session, user};
use sea_orm::ConnectionTrait;
use tracing::{debug, instrument, warn};

use super::{Amount, LedgerError};
use crate::errors::ServiceError;

/// Attempts at the compare-and-set before giving up as contended storage.
const CAS_ATTEMPTS: u32 = 3;

#[instrument(skip(conn))]
pub async fn get_balance<C: ConnectionTrait>(conn: &C, username: &str) -> Result<Amount, ServiceError> {
    let row = user::find(conn, username).await?.ok_or(ServiceError::NotFound)?;
    stored_balance(row.balance)
}

/// Add `amount` and return the new balance. A zero deposit is accepted.
#[instrument(skip(conn), fields(amount = %amount))]
pub async fn deposit<C: ConnectionTrait>(conn: &C, username: &str, amount: Amount) -> Result<Amount, ServiceError> {
    apply(conn, username, |balance| balance.checked_add(amount).ok_or(LedgerError::BalanceOverflow)).await
}

/// Subtract `amount` and return the new balance. Over-withdrawal leaves the
/// row untouched and reports the current balance.
#[instrument(skip(conn), fields(amount = %amount))]
pub async fn withdraw<C: ConnectionTrait>(conn: &C, username: &str, amount: Amount) -> Result<Amount, ServiceError> {
    if amount.is_zero() {
        return Err(LedgerError::InvalidAmount.into());
    }
    apply(conn, username, |balance| {
        balance.checked_sub(amount).ok_or(LedgerError::InsufficientFunds { balance })
    })
    .await
}

/// Delete the account whatever its balance. Sessions are invalidated first so
/// nothing can act for the user between the two statements even on a store
/// without cascading deletes. Returns the number of sessions revoked.
#[instrument(skip(conn))]
pub async fn close<C: ConnectionTrait>(conn: &C, username: &str) -> Result<u64, ServiceError> {
    let revoked = session::invalidate_for_user(conn, username).await?;
    if !user::delete(conn, username).await? {
        return Err(ServiceError::NotFound);
    }
    debug!(revoked, "account closed");
    Ok(revoked)
}

async fn apply<C, F>(conn: &C, username: &str, next: F) -> Result<Amount, ServiceError>
where
    C: ConnectionTrait,
    F: Fn(Amount) -> Result<Amount, LedgerError>,
{
    for attempt in 1..=CAS_ATTEMPTS {
        let row = user::find_for_update(conn, username).await?.ok_or(ServiceError::NotFound)?;
        let current = stored_balance(row.balance)?;
        let updated = next(current)?;
        if user::compare_and_set_balance(conn, username, current.minor(), updated.minor()).await? {
            return Ok(updated);
        }
        warn!(attempt, "balance changed between read and write; retrying");
    }
    Err(ServiceError::StorageUnavailable(format!(
        "balance update for {username} lost {CAS_ATTEMPTS} compare-and-set races"
    )))
}

fn stored_balance(raw: i64) -> Result<Amount, ServiceError> {
    Amount::from_minor(raw).ok_or_else(|| ServiceError::Unexpected(format!("negative stored balance {raw}")))
}
