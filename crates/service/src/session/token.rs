use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes per token; 256 bits of entropy.
pub const TOKEN_BYTES: usize = 32;

/// A session identifier: `TOKEN_BYTES` from the OS RNG, lowercase hex.
///
/// `Debug` only shows a short prefix so the full token never reaches logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Accept only well-formed tokens; anything else cannot name a session.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == TOKEN_BYTES * 2 && raw.bytes().all(|b| b.is_ascii_hexdigit());
        well_formed.then(|| Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn into_string(self) -> String { self.0 }

    /// First 8 characters, for log lines.
    pub fn prefix(&self) -> &str { &self.0[..8] }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}…)", self.prefix())
    }
}
