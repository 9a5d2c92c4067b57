//! Password hashing and verification.
//!
//! A failed comparison returns `Ok(false)`; a hasher failure (malformed
//! hash, internal error) returns an `INTERNAL` error. Callers must keep the
//! two apart: only the former means "wrong password".

use anyhow::anyhow;

use crate::errors::AppError;

/// bcrypt work factor. Raising it invalidates nothing, it only slows new
/// hashes down.
const BCRYPT_COST: u32 = 13;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AppError::internal(anyhow!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AppError::internal(anyhow!("failed to verify password: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert_ne!(hash, "correct horse battery staple");
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error_not_false() {
        let result = verify_password("anything", "not-a-bcrypt-hash");
        assert!(result.is_err());
    }
}
