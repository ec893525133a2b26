use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use engine::{CredentialHasher, EngineError};

/// Argon2id with the crate defaults, PHC string output.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String, EngineError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| EngineError::Credential(err.to_string()))
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, EngineError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| EngineError::Credential(err.to_string()))?;
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = Argon2Hasher::default();
        let hash = hasher.hash("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("s3cret", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn unreadable_hash_is_an_error() {
        let hasher = Argon2Hasher::default();
        assert!(hasher.verify("s3cret", "plain-text").is_err());
    }
}
