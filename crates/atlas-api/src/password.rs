//! Password hashing with argon2.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use atlas_core::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

/// Constant-time verification against a stored digest. A digest that does not
/// parse counts as a mismatch rather than an error so login failures stay
/// indistinguishable.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let digest = hash_password("Password123!").unwrap();
        assert!(digest.starts_with("$argon2"));
        assert!(verify_password("Password123!", &digest));
        assert!(!verify_password("password123!", &digest));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_digest_never_verifies() {
        assert!(!verify_password("anything", "not-a-digest"));
        assert!(!verify_password("anything", ""));
    }
}
