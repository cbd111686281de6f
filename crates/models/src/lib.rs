//! Storage layer: sea-orm entities for `users` and `sessions` plus the
//! data-access helpers the service layer composes into transactions.
//!
//! Every helper is generic over [`sea_orm::ConnectionTrait`] so it runs the
//! same on a pooled connection or inside a `DatabaseTransaction`.

pub mod errors;
pub mod db;
pub mod user;
pub mod session;

#[cfg(test)]
mod tests;
