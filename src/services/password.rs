use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ServiceError;

/// Hash a room password into an argon2 PHC string.
pub fn hash_password(plain: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Internal(format!("failed to hash room password: {err}")))
}

/// Check `plain` against a stored PHC string.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|err| ServiceError::Internal(format!("stored password hash is invalid: {err}")))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("birdie").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("birdie", &hash).unwrap());
        assert!(!verify_password("bogey", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("ace").unwrap(), hash_password("ace").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("ace", "not-a-phc-string").is_err());
    }
}
