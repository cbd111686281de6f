//! Per-user balance bookkeeping.
//!
//! Balances live in the `users` row as integer minor units. Every mutation
//! runs on the caller's connection/transaction, reads the row under an
//! exclusive lock and writes it back with a compare-and-set, so concurrent
//! deposits never lose an update.

pub mod amount;
pub mod errors;
pub mod service;

pub use amount::{Amount, MINOR_UNITS};
pub use errors::LedgerError;
pub use service::{close, deposit, get_balance, withdraw};
