use thiserror::Error;

use super::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid amount")]
    InvalidAmount,
    #[error("amount exceeds maximum allowed")]
    AmountTooLarge,
    #[error("balance overflow")]
    BalanceOverflow,
    #[error("insufficient funds. balance={}", .balance.whole_units())]
    InsufficientFunds { balance: Amount },
}
