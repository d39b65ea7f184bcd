//! Argon2id credential hashing for stored accounts.

use anyhow::anyhow;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Hashes a sign-up password into a PHC string for the `users.password_hash` column.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| {
            error!(error = %e, "could not hash password");
            anyhow!("hash password: {e}")
        })
}

/// `Ok(false)` only for a wrong password. A stored hash that cannot be
/// parsed or checked is an error, not a failed login.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let phc = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow!("parse stored hash: {e}")
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &phc) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, algorithm = %phc.algorithm, "stored password hash is unusable");
            Err(anyhow!("verify password: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_accepts_its_own_password() {
        let stored = hash_password("Secur3P@ssw0rd!").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("Secur3P@ssw0rd!", &stored).unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let stored = hash_password("correct-horse-battery-staple").unwrap();
        assert!(!verify_password("wrong-password", &stored).unwrap());
    }

    #[test]
    fn each_hash_gets_a_fresh_salt() {
        let a = hash_password("repeat-me-please").unwrap();
        let b = hash_password("repeat-me-please").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("repeat-me-please", &a).unwrap());
        assert!(verify_password("repeat-me-please", &b).unwrap());
    }

    #[test]
    fn garbage_in_the_column_is_an_error() {
        assert!(verify_password("anything", "not-a-valid-hash").is_err());
    }

    #[test]
    fn foreign_scheme_is_an_error_not_a_mismatch() {
        let pbkdf2 = "$pbkdf2-sha256$i=1000$c2FsdHNhbHQ$MDEyMzQ1Njc4OWFiY2RlZg";
        assert!(verify_password("anything", pbkdf2).is_err());
    }
}
