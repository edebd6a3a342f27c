//! # Account Service
//!
//! Registration and login. Login is the only place credentials are issued.

use chrono::{DateTime, Utc};

use super::crypto::PasswordPolicy;
use super::errors::{AuthError, AuthResult};
use super::jwt::{IssuedToken, JwtManager};
use super::user::{LoginRequest, RegisterRequest, User, UserRepository};

/// Auth service combining the user repository and the token issuer
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    jwt_manager: JwtManager,
    password_policy: PasswordPolicy,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, jwt_manager: JwtManager, password_policy: PasswordPolicy) -> Self {
        Self {
            user_repo,
            jwt_manager,
            password_policy,
        }
    }

    /// Register a new account
    pub fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();
        if username.is_empty() {
            return Err(AuthError::InvalidAccountField("username".to_string()));
        }
        if !email.contains('@') {
            return Err(AuthError::InvalidAccountField("email".to_string()));
        }

        if self.user_repo.find_by_email(&email)?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let user = User::new(username, email, &request.password, &self.password_policy)?;
        self.user_repo.create(&user)?;

        tracing::info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Authenticate and issue an access token
    pub fn login(&self, request: LoginRequest, now: DateTime<Utc>) -> AuthResult<(User, IssuedToken)> {
        let user = self
            .user_repo
            .find_by_email(request.email.trim())?
            .ok_or(AuthError::InvalidLogin)?;

        if !user.verify_password(&request.password)? {
            tracing::warn!(user_id = %user.id, "login rejected");
            return Err(AuthError::InvalidLogin);
        }

        let issued = self.jwt_manager.issue(&user, now)?;
        Ok((user, issued))
    }

    pub fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }
}
