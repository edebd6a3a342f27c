//! # User Accounts
//!
//! Account model and repositories. Accounts exist only so that a subject can
//! obtain a credential; the access engine never reads them. An account id is
//! the owner id of every private file its holder uploads, so a persisted
//! record store needs a persisted account store beside it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crypto::{hash_password, verify_password, PasswordPolicy};
use super::errors::{AuthError, AuthResult};

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// Display name (unique)
    pub username: String,

    /// Email address (unique, stored lowercase)
    pub email: String,

    /// Argon2id password hash (never plaintext)
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user, validating and hashing the password
    pub fn new(
        username: String,
        email: String,
        password: &str,
        policy: &PasswordPolicy,
    ) -> AuthResult<Self> {
        policy.validate(password)?;
        let password_hash = hash_password(password)?;

        Ok(Self {
            id: Uuid::new_v4(),
            username,
            email: email.to_lowercase(),
            password_hash,
            created_at: Utc::now(),
        })
    }

    /// Verify a password against this user's stored hash
    pub fn verify_password(&self, password: &str) -> AuthResult<bool> {
        verify_password(password, &self.password_hash)
    }
}

/// Account registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User repository trait
pub trait UserRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Insert a user, rejecting duplicate emails and usernames
    fn create(&self, user: &User) -> AuthResult<()>;
}

impl<U: UserRepository + ?Sized> UserRepository for Arc<U> {
    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        (**self).find_by_email(email)
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        (**self).create(user)
    }
}

fn lock_poisoned() -> AuthError {
    AuthError::StorageError("Lock poisoned".to_string())
}

fn ensure_unique(users: &[User], user: &User) -> AuthResult<()> {
    if users.iter().any(|u| u.email == user.email) {
        return Err(AuthError::EmailAlreadyExists);
    }
    if users.iter().any(|u| u.username == user.username) {
        return Err(AuthError::UsernameAlreadyExists);
    }
    Ok(())
}

/// In-memory user repository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let email = email.to_lowercase();
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().map_err(|_| lock_poisoned())?;
        ensure_unique(&users, user)?;
        users.push(user.clone());
        Ok(())
    }
}

// ==================
// JSON File Repository
// ==================

/// On-disk form of an account; unlike `User`, it carries the password hash
#[derive(Debug, Serialize, Deserialize)]
struct StoredUser {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<&User> for StoredUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<StoredUser> for User {
    fn from(stored: StoredUser) -> Self {
        Self {
            id: stored.id,
            username: stored.username,
            email: stored.email,
            password_hash: stored.password_hash,
            created_at: stored.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct UserSnapshot {
    version: u32,
    users: Vec<StoredUser>,
}

const USER_SNAPSHOT_VERSION: u32 = 1;

/// User repository persisted as a single JSON document
///
/// Each registration rewrites the document through a temporary file and a
/// rename under the write lock. A failed write drops the new account again.
#[derive(Debug)]
pub struct JsonFileUserRepository {
    path: PathBuf,
    users: RwLock<Vec<User>>,
}

impl JsonFileUserRepository {
    /// Open (or start) an account file
    pub fn open(path: impl Into<PathBuf>) -> AuthResult<Self> {
        let path = path.into();

        let users = match fs::read(&path) {
            Ok(bytes) => {
                let snapshot: UserSnapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    AuthError::StorageError(format!("corrupt account file: {}", e))
                })?;
                if snapshot.version != USER_SNAPSHOT_VERSION {
                    return Err(AuthError::StorageError(format!(
                        "unsupported account file version {}",
                        snapshot.version
                    )));
                }
                snapshot.users.into_iter().map(User::from).collect()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(AuthError::StorageError(e.to_string())),
        };

        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, users: &[User]) -> AuthResult<()> {
        let snapshot = UserSnapshot {
            version: USER_SNAPSHOT_VERSION,
            users: users.iter().map(StoredUser::from).collect(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| AuthError::StorageError(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| AuthError::StorageError(e.to_string()))?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes).map_err(|e| AuthError::StorageError(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            AuthError::StorageError(e.to_string())
        })
    }
}

impl UserRepository for JsonFileUserRepository {
    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let email = email.to_lowercase();
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().map_err(|_| lock_poisoned())?;
        ensure_unique(&users, user)?;
        users.push(user.clone());

        if let Err(e) = self.persist(&users) {
            users.pop();
            return Err(e);
        }
        Ok(())
    }
}
