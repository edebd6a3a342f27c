//! # Auth Module
//!
//! Account registration, credential issuing and stateless credential
//! verification, plus the password hashing shared with the access engine.

pub mod api;
pub mod crypto;
pub mod errors;
pub mod jwt;
pub mod user;

pub use api::AuthService;
pub use crypto::{Argon2Hasher, CredentialHasher, PasswordPolicy};
pub use errors::{AuthError, AuthResult};
pub use jwt::{IssuedToken, JwtClaims, JwtConfig, JwtManager, TokenVerifier};
pub use user::{
    InMemoryUserRepository, JsonFileUserRepository, LoginRequest, RegisterRequest, User,
    UserRepository,
};
