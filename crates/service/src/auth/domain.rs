use crate::session::{ClientInfo, SessionId};

/// Registration input
#[derive(Clone)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
}

/// Login input
#[derive(Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub client: ClientInfo,
}

/// Login result
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub username: String,
    pub session_id: SessionId,
    /// The stored credential was rewritten to the current hash format.
    pub credential_upgraded: bool,
}
