//! Request authorizer for balance operations.
//!
//! One call is one unit of work: a single transaction spans the session
//! check, the `last_used` refresh and the ledger mutation.

use std::fmt;
use std::time::Duration;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::errors::{AuthFailure, ServiceError};
use crate::ledger::{self, Amount};
use crate::session::SessionManager;
use crate::unit_of_work::bounded;

/// Raw `/manage` parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManageRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManageAction {
    Deposit(Amount),
    Withdraw(Amount),
    Balance,
    Close,
}

impl ManageAction {
    /// Action names are case-insensitive. The amount is only read for
    /// deposits and withdrawals.
    pub fn parse(request: &ManageRequest) -> Result<Self, ServiceError> {
        let action = request.action.as_deref().unwrap_or("").trim().to_ascii_lowercase();
        let amount = || Amount::parse(request.amount.as_deref().unwrap_or(""));
        match action.as_str() {
            "deposit" => Ok(ManageAction::Deposit(amount()?)),
            "withdraw" => Ok(ManageAction::Withdraw(amount()?)),
            "balance" => Ok(ManageAction::Balance),
            "close" => Ok(ManageAction::Close),
            _ => Err(ServiceError::validation("invalid action")),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ManageAction::Deposit(_) => "deposit",
            ManageAction::Withdraw(_) => "withdraw",
            ManageAction::Balance => "balance",
            ManageAction::Close => "close",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageOutcome {
    Deposited { amount: Amount, balance: Amount },
    Withdrew { amount: Amount, balance: Amount },
    Balance(Amount),
    Closed { username: String },
}

impl ManageOutcome {
    pub fn action(&self) -> &'static str {
        match self {
            ManageOutcome::Deposited { .. } => "deposit",
            ManageOutcome::Withdrew { .. } => "withdraw",
            ManageOutcome::Balance(_) => "balance",
            ManageOutcome::Closed { .. } => "close",
        }
    }
}

/// Amounts and balances are echoed in whole units, truncated.
impl fmt::Display for ManageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManageOutcome::Deposited { amount, balance } => {
                write!(f, "Deposited {}. balance={}", amount.whole_units(), balance.whole_units())
            }
            ManageOutcome::Withdrew { amount, balance } => {
                write!(f, "Withdrew {}. balance={}", amount.whole_units(), balance.whole_units())
            }
            ManageOutcome::Balance(balance) => write!(f, "balance={}", balance.whole_units()),
            ManageOutcome::Closed { username } => write!(f, "Account for {username} closed."),
        }
    }
}

#[derive(Clone)]
pub struct Authorizer {
    db: DatabaseConnection,
    sessions: SessionManager,
    request_timeout: Duration,
}

impl Authorizer {
    pub fn new(db: DatabaseConnection, sessions: SessionManager, request_timeout: Duration) -> Self {
        Self { db, sessions, request_timeout }
    }

    /// Authenticate `token` and apply `request` to its user's account.
    ///
    /// The transaction commits on success and on ledger rejections, so the
    /// session refresh survives an over-withdrawal. Every other failure
    /// rolls back.
    #[instrument(skip(self, token, request), fields(action = request.action.as_deref().unwrap_or("")))]
    pub async fn manage(&self, token: Option<&str>, request: &ManageRequest) -> Result<ManageOutcome, ServiceError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(ServiceError::Unauthenticated(AuthFailure::MissingToken))?;

        bounded(self.request_timeout, async {
            let txn = self.db.begin().await?;
            let username = self.sessions.validate_and_touch_in(&txn, token).await?;
            let action = ManageAction::parse(request)?;

            let result = dispatch(&txn, &username, action).await;
            match &result {
                Ok(outcome) => {
                    txn.commit().await?;
                    info!(username = %username, action = action.name(), "manage_ok");
                    debug!(%outcome);
                }
                Err(ServiceError::Domain(e)) => {
                    txn.commit().await?;
                    info!(username = %username, action = action.name(), reason = %e, "manage_rejected");
                }
                Err(_) => txn.rollback().await?,
            }
            result
        })
        .await
    }
}

async fn dispatch<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    action: ManageAction,
) -> Result<ManageOutcome, ServiceError> {
    match action {
        ManageAction::Deposit(amount) => {
            let balance = ledger::deposit(conn, username, amount).await?;
            Ok(ManageOutcome::Deposited { amount, balance })
        }
        ManageAction::Withdraw(amount) => {
            let balance = ledger::withdraw(conn, username, amount).await?;
            Ok(ManageOutcome::Withdrew { amount, balance })
        }
        ManageAction::Balance => Ok(ManageOutcome::Balance(ledger::get_balance(conn, username).await?)),
        ManageAction::Close => {
            ledger::close(conn, username).await?;
            Ok(ManageOutcome::Closed { username: username.to_string() })
        }
    }
}
