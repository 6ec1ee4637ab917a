//! Password hashing and verification using Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::TreeError;

/// Hash a password using Argon2id, returning a PHC-formatted string
pub fn hash_password(password: &str) -> Result<String, TreeError> {
    if password.is_empty() {
        return Err(TreeError::BadRequest("Password must not be empty".into()));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| TreeError::Auth(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, TreeError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| TreeError::Auth(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("sponsor-secret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("sponsor-secret", &hash).unwrap());
        assert!(!verify_password("guess", &hash).unwrap());
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(matches!(hash_password(""), Err(TreeError::BadRequest(_))));
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("pw", "plaintext").is_err());
    }
}
