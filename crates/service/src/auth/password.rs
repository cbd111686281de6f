//! Stored-credential verification with upgrade-on-login.
//!
//! Accepted stored formats:
//! - PHC strings (`$argon2id$...`), the format every new hash is written in;
//! - werkzeug `scrypt[:N:r:p]$salt$hexdigest`, werkzeug's default since 3.0;
//! - werkzeug `pbkdf2:sha256[:iterations]$salt$hexdigest`;
//! - legacy plaintext, recognised by carrying neither `$` nor `:`.
//!
//! A successful match against anything but a PHC string asks the caller to
//! replace the stored value with a fresh Argon2id hash.

use argon2::password_hash::{Error as PhcError, Output, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::errors::ServiceError;

/// werkzeug's default when a `pbkdf2:sha256` method omits the round count.
const WERKZEUG_DEFAULT_ITERATIONS: u32 = 260_000;

/// werkzeug's `scrypt` cost when the method carries no parameters.
const WERKZEUG_SCRYPT_N: u64 = 1 << 15;
const WERKZEUG_SCRYPT_R: u32 = 8;
const WERKZEUG_SCRYPT_P: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Rejected,
    Accepted,
    /// Accepted; store this hash in place of the old value.
    Upgrade(String),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool { !matches!(self, Verdict::Rejected) }
}

/// Salted Argon2id hash in PHC string form.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::Unexpected(format!("password hashing failed: {e}")))
}

pub fn verify_and_maybe_upgrade(stored: &str, supplied: &str) -> Result<Verdict, ServiceError> {
    if stored.starts_with('$') {
        return verify_phc(stored, supplied);
    }
    let werkzeug = if stored.starts_with("scrypt:") || stored.starts_with("scrypt$") {
        Some(verify_werkzeug_scrypt(stored, supplied)?)
    } else if stored.starts_with("pbkdf2:") {
        Some(verify_werkzeug_pbkdf2(stored, supplied)?)
    } else {
        None
    };
    if let Some(matched) = werkzeug {
        return match matched {
            true => Ok(Verdict::Upgrade(hash_password(supplied)?)),
            false => Ok(Verdict::Rejected),
        };
    }
    if stored.contains('$') || stored.contains(':') {
        return Err(unsupported());
    }
    if stored.as_bytes() == supplied.as_bytes() {
        Ok(Verdict::Upgrade(hash_password(supplied)?))
    } else {
        Ok(Verdict::Rejected)
    }
}

fn verify_phc(stored: &str, supplied: &str) -> Result<Verdict, ServiceError> {
    let parsed = PasswordHash::new(stored).map_err(|_| unsupported())?;
    if !parsed.algorithm.as_str().starts_with("argon2") || parsed.hash.is_none() {
        return Err(unsupported());
    }
    match Argon2::default().verify_password(supplied.as_bytes(), &parsed) {
        Ok(()) => Ok(Verdict::Accepted),
        Err(PhcError::Password) => Ok(Verdict::Rejected),
        Err(PhcError::Algorithm) => Err(unsupported()),
        Err(e) => Err(ServiceError::Unexpected(format!("password verification failed: {e}"))),
    }
}

/// Split `method$salt$hexdigest`.
fn werkzeug_parts(stored: &str) -> Result<(&str, &str, &str), ServiceError> {
    let mut parts = stored.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(salt), Some(digest)) => Ok((method, salt, digest)),
        _ => Err(unsupported()),
    }
}

fn verify_werkzeug_scrypt(stored: &str, supplied: &str) -> Result<bool, ServiceError> {
    let (method, salt, digest) = werkzeug_parts(stored)?;

    let mut method = method.split(':');
    if method.next() != Some("scrypt") {
        return Err(unsupported());
    }
    let (n, r, p) = match (method.next(), method.next(), method.next(), method.next()) {
        (None, ..) => (WERKZEUG_SCRYPT_N, WERKZEUG_SCRYPT_R, WERKZEUG_SCRYPT_P),
        (Some(n), Some(r), Some(p), None) => (
            n.parse::<u64>().map_err(|_| unsupported())?,
            r.parse::<u32>().map_err(|_| unsupported())?,
            p.parse::<u32>().map_err(|_| unsupported())?,
        ),
        _ => return Err(unsupported()),
    };
    // N must be a power of two above one
    if n < 2 || !n.is_power_of_two() {
        return Err(unsupported());
    }

    let expected = hex::decode(digest).map_err(|_| unsupported())?;
    let expected = Output::new(&expected).map_err(|_| unsupported())?;
    let params = scrypt::Params::new(n.trailing_zeros() as u8, r, p, expected.len()).map_err(|_| unsupported())?;
    let mut derived = vec![0u8; expected.len()];
    scrypt::scrypt(supplied.as_bytes(), salt.as_bytes(), &params, &mut derived).map_err(|_| unsupported())?;
    let derived = Output::new(&derived).map_err(|_| unsupported())?;

    Ok(derived == expected)
}

fn verify_werkzeug_pbkdf2(stored: &str, supplied: &str) -> Result<bool, ServiceError> {
    let (method, salt, digest) = werkzeug_parts(stored)?;

    let mut method = method.split(':');
    if method.next() != Some("pbkdf2") || method.next() != Some("sha256") {
        return Err(unsupported());
    }
    let iterations = match method.next() {
        Some(n) => n.parse::<u32>().map_err(|_| unsupported())?,
        None => WERKZEUG_DEFAULT_ITERATIONS,
    };
    if iterations == 0 || method.next().is_some() {
        return Err(unsupported());
    }

    let expected = hex::decode(digest).map_err(|_| unsupported())?;
    let expected = Output::new(&expected).map_err(|_| unsupported())?;
    let mut derived = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(supplied.as_bytes(), salt.as_bytes(), iterations, &mut derived);
    let derived = Output::new(&derived).map_err(|_| unsupported())?;

    // Output equality is constant-time
    Ok(derived == expected)
}

fn unsupported() -> ServiceError {
    ServiceError::Unexpected("unsupported credential format".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WERKZEUG_SECRET: &str =
        "pbkdf2:sha256:1000$NaCl1234$c63d55068de333b03174c8f309b826b67b39da28b35d02973de339c53ac7f5ed";

    // generate_password_hash("secret") from werkzeug 3, default scrypt cost
    const WERKZEUG_SCRYPT_SECRET: &str = "scrypt:32768:8:1$Zq9sXk2LmPa1Rt7Y$3dd5d4a76cc1bc2f4a683f550dbe3d834ec34f75b22a5c1a0058df39ff4892039d15c9e19b6a9647d9f5d37451bd0fa4e922af72900992431ab5c6f86bf7601d";

    const WERKZEUG_SCRYPT_CHEAP: &str = "scrypt:1024:8:1$NaCl1234$ada565219f855d16a557affee9c1b4f2ec1d1b0cf52d6facb6191fd9b53cb9ac494f598e43917e5a64d93f9080b8e4d296a19fcffb8c3cfa3e1472262c9f3694";

    fn is_argon2(hash: &str) -> bool { hash.starts_with("$argon2id$") }

    #[test]
    fn fresh_hash_verifies_without_upgrade() {
        let hash = hash_password("secret").unwrap();
        assert!(is_argon2(&hash));
        assert_eq!(verify_and_maybe_upgrade(&hash, "secret").unwrap(), Verdict::Accepted);
        assert_eq!(verify_and_maybe_upgrade(&hash, "Secret").unwrap(), Verdict::Rejected);
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn plaintext_match_requests_upgrade() {
        match verify_and_maybe_upgrade("secret", "secret").unwrap() {
            Verdict::Upgrade(new_hash) => {
                assert!(is_argon2(&new_hash));
                assert_eq!(verify_and_maybe_upgrade(&new_hash, "secret").unwrap(), Verdict::Accepted);
            }
            other => panic!("expected upgrade, got {other:?}"),
        }
    }

    #[test]
    fn plaintext_mismatch_is_rejected_without_upgrade() {
        assert_eq!(verify_and_maybe_upgrade("secret", "guess").unwrap(), Verdict::Rejected);
        assert!(!Verdict::Rejected.is_accepted());
    }

    #[test]
    fn werkzeug_pbkdf2_verifies_and_upgrades() {
        match verify_and_maybe_upgrade(WERKZEUG_SECRET, "secret").unwrap() {
            Verdict::Upgrade(new_hash) => assert!(is_argon2(&new_hash)),
            other => panic!("expected upgrade, got {other:?}"),
        }
        assert_eq!(verify_and_maybe_upgrade(WERKZEUG_SECRET, "secrets").unwrap(), Verdict::Rejected);
    }

    #[test]
    fn werkzeug_scrypt_verifies_and_upgrades() {
        match verify_and_maybe_upgrade(WERKZEUG_SCRYPT_SECRET, "secret").unwrap() {
            Verdict::Upgrade(new_hash) => {
                assert!(is_argon2(&new_hash));
                assert_eq!(verify_and_maybe_upgrade(&new_hash, "secret").unwrap(), Verdict::Accepted);
            }
            other => panic!("expected upgrade, got {other:?}"),
        }
        assert!(verify_and_maybe_upgrade(WERKZEUG_SCRYPT_CHEAP, "secret").unwrap().is_accepted());
        assert_eq!(verify_and_maybe_upgrade(WERKZEUG_SCRYPT_CHEAP, "Secret").unwrap(), Verdict::Rejected);
    }

    #[test]
    fn unknown_hashed_formats_are_errors_not_mismatches() {
        for stored in [
            "scrypt:32768:8:1$salt$not-hex",
            "scrypt:1000:8:1$salt$abcdef0123456789abcdef",
            "scrypt:1024:8$salt$abcdef0123456789abcdef",
            "bcrypt:12$salt$abcdef0123456789abcdef",
            "pbkdf2:sha1:1000$salt$abcdef0123456789abcdef",
            "pbkdf2:sha256:many$salt$abcdef0123456789abcdef",
            "pbkdf2:sha256:1000$salt$not-hex",
            "$unknown$v=1$abc",
            "user:pass",
        ] {
            let err = verify_and_maybe_upgrade(stored, "secret").unwrap_err();
            assert!(
                matches!(err, ServiceError::Unexpected(ref m) if m == "unsupported credential format"),
                "stored {stored}: {err:?}"
            );
        }
    }
}
