//! # JWT Credentials
//!
//! Bearer credentials are HS256 JSON Web Tokens. Issuing happens at login;
//! verification is stateless and takes the current instant as an argument,
//! so expiry decisions never consult the wall clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AuthError, AuthResult};
use super::user::User;

/// Validates a bearer credential and yields the subject it is bound to
pub trait TokenVerifier: Send + Sync {
    /// Verify a credential at instant `now`
    fn verify(&self, credential: &str, now: DateTime<Utc>) -> AuthResult<Uuid>;

    /// Verify a credential the calling context cannot do without
    fn require(&self, credential: Option<&str>, now: DateTime<Utc>) -> AuthResult<Uuid> {
        match credential {
            Some(token) => self.verify(token, now),
            None => Err(AuthError::MissingCredential),
        }
    }
}

/// JWT claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// User's email
    pub email: String,

    /// Issued at (Unix epoch seconds)
    pub iat: i64,

    /// Expiration (Unix epoch seconds)
    pub exp: i64,

    pub aud: String,

    pub iss: String,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret
    pub secret: String,

    /// Access token lifetime
    pub access_token_ttl: Duration,

    pub issuer: String,

    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "CHANGE_THIS_SECRET_IN_PRODUCTION".to_string(),
            access_token_ttl: Duration::hours(1),
            issuer: "filegate".to_string(),
            audience: "filegate".to_string(),
        }
    }
}

/// A freshly issued access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT manager for token issuing and verification
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue an access token for a user
    ///
    /// The token carries only the user ID and email, never secrets.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let expires_at = now + self.config.access_token_ttl;

        let claims = JwtClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Decode and signature-check a token without judging its expiry
    pub fn decode_claims(&self, token: &str) -> AuthResult<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        // Expiry is judged against the injected instant in `verify`
        validation.validate_exp = false;
        validation.leeway = 0;

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidCredential)
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.config.access_token_ttl
    }
}

impl TokenVerifier for JwtManager {
    fn verify(&self, credential: &str, now: DateTime<Utc>) -> AuthResult<Uuid> {
        let claims = self.decode_claims(credential)?;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::ExpiredCredential);
        }

        Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidCredential)
    }
}
