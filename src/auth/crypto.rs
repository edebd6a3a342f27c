//! # Cryptographic Utilities
//!
//! Password hashing, password policy and random secret generation.
//!
//! Passwords (account and per-file) are only ever stored as Argon2id PHC
//! strings.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;

use super::errors::{AuthError, AuthResult};

/// One-way hashing of plaintext secrets
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext into a self-describing hash string
    fn hash(&self, plaintext: &str) -> AuthResult<String>;

    /// Check a plaintext against a stored hash
    fn check(&self, plaintext: &str, hash: &str) -> bool;
}

/// Argon2id hasher with default parameters
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> AuthResult<String> {
        hash_password(plaintext)
    }

    fn check(&self, plaintext: &str, hash: &str) -> bool {
        match verify_password(plaintext, hash) {
            Ok(matches) => matches,
            Err(_) => {
                tracing::warn!("stored password hash could not be parsed");
                false
            }
        }
    }
}

/// Password requirements
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Minimum length in characters (not bytes)
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordPolicy {
    pub fn with_min_length(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Validate a password against this policy
    pub fn validate(&self, password: &str) -> AuthResult<()> {
        if !self.is_satisfied_by(password) {
            return Err(AuthError::WeakPassword(format!(
                "Password must be at least {} characters",
                self.min_length
            )));
        }
        Ok(())
    }

    pub fn is_satisfied_by(&self, password: &str) -> bool {
        password.chars().count() >= self.min_length
    }
}

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::HashingFailed)
}

/// Verify a password against its hash
///
/// Comparison is constant-time inside the argon2 crate.
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::HashingFailed)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a 256-bit random secret, URL-safe base64 encoded
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}
