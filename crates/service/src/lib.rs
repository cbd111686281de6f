//! Business layer of the bank service.
//! - `auth`: registration, login, password verification and upgrade-on-login.
//! - `session`: opaque session tokens, idle timeout, single active session.
//! - `ledger`: balance arithmetic in minor units with overflow/sufficiency checks.
//! - `authorizer`: one unit of work per request, session check then ledger.
//!
//! Nothing here knows about HTTP; the server crate maps [`errors::ServiceError`]
//! to responses.

pub mod errors;
pub mod auth;
pub mod session;
pub mod ledger;
pub mod authorizer;
pub mod context;
pub mod unit_of_work;
#[cfg(test)]
pub mod test_support;

pub use context::{ServiceContext, ServiceSettings};
pub use errors::{AuthFailure, ServiceError};
