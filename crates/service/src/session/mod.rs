//! Opaque session tokens bound to a user, with a single-active-session policy
//! and a lazily evaluated idle timeout.

pub mod manager;
pub mod token;

pub use manager::SessionManager;
pub use token::SessionId;

/// Where a request came from. Recorded on the session row for auditing only;
/// never used to authorise anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(ip: impl Into<String>, user_agent: Option<String>) -> Self {
        Self { ip: ip.into(), user_agent }
    }

    pub fn unknown() -> Self { Self::new("unknown", None) }
}
