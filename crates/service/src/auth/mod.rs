//! Auth module: domain inputs, password verification, and the service that
//! registers users and opens/closes sessions.

pub mod domain;
pub mod password;
pub mod service;

pub use service::AuthService;
