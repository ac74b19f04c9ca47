use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use crate::error::VerificationError;

/// Hashes a password with Argon2 on the blocking pool and returns the PHC string.
#[tracing::instrument(name = "Hashing user password", skip(password))]
pub async fn hash(password: &[u8]) -> Result<String, VerificationError> {
    let password = password.to_vec();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(&password, &salt)
            .map(|hashed| hashed.to_string())
            .map_err(|e| VerificationError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| VerificationError::PasswordHash(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_produces_salted_argon2_strings() {
        let first = hash(b"correct horse").await.unwrap();
        let second = hash(b"correct horse").await.unwrap();

        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second);
    }
}
