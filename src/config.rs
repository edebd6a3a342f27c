//! # Configuration
//!
//! A single JSON file. Every field has a default, so a file only needs to
//! name what it changes. The JWT secret may instead come from the
//! `FILEGATE_JWT_SECRET` environment variable, which wins over the file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::EngineConfig;
use crate::auth::JwtConfig;
use crate::http_server::HttpServerConfig;

/// Environment variable overriding `jwt.secret`
pub const JWT_SECRET_ENV: &str = "FILEGATE_JWT_SECRET";

const MAX_ACCESS_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root of blob storage, the metadata file and the account file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Keep file metadata and accounts on disk; in-memory only when false
    #[serde(default = "default_true")]
    pub persist_metadata: bool,

    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub jwt: JwtSettings,

    #[serde(default)]
    pub upload: UploadSettings,

    #[serde(default)]
    pub retention: RetentionSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtSettings {
    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: u64,

    #[serde(default = "default_token_party")]
    pub issuer: String,

    #[serde(default = "default_token_party")]
    pub audience: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Minimum length of a file password
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Limit on the whole multipart upload request body in bytes, form
    /// fields and boundaries included
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    #[serde(default = "default_true")]
    pub private_requires_auth: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionSettings {
    /// Seconds between sweeps of expired files; 0 disables sweeping
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./filegate-data")
}

fn default_true() -> bool {
    true
}

fn default_access_token_ttl() -> u64 {
    3600
}

fn default_token_party() -> String {
    "filegate".to_string()
}

fn default_min_password_length() -> usize {
    6
}

fn default_max_request_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_sweep_interval() -> u64 {
    300
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_ttl_secs: default_access_token_ttl(),
            issuer: default_token_party(),
            audience: default_token_party(),
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            max_request_bytes: default_max_request_bytes(),
            private_requires_auth: true,
        }
    }
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            persist_metadata: true,
            http: HttpServerConfig::default(),
            jwt: JwtSettings::default(),
            upload: UploadSettings::default(),
            retention: RetentionSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Config {
    /// Load, apply environment overrides and validate
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut config = Self::from_json(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parse without validating
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(JWT_SECRET_ENV).filter(|s| !s.is_empty()) {
            self.jwt.secret = secret;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "jwt.secret must be set (or provide {})",
                JWT_SECRET_ENV
            )));
        }

        if self.jwt.access_token_ttl_secs == 0
            || self.jwt.access_token_ttl_secs > MAX_ACCESS_TOKEN_TTL_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "jwt.access_token_ttl_secs must be between 1 and {}",
                MAX_ACCESS_TOKEN_TTL_SECS
            )));
        }

        if self.upload.min_password_length == 0 {
            return Err(ConfigError::Invalid(
                "upload.min_password_length must be > 0".to_string(),
            ));
        }

        if self.upload.max_request_bytes == 0 {
            return Err(ConfigError::Invalid(
                "upload.max_request_bytes must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Pretty JSON, as written by `filegate init`
    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join("metadata.json")
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt.secret.clone(),
            access_token_ttl: Duration::seconds(
                i64::try_from(self.jwt.access_token_ttl_secs.min(MAX_ACCESS_TOKEN_TTL_SECS))
                    .unwrap_or(0),
            ),
            issuer: self.jwt.issuer.clone(),
            audience: self.jwt.audience.clone(),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            min_password_length: self.upload.min_password_length,
            private_requires_auth: self.upload.private_requires_auth,
        }
    }

    /// Sweep interval, if sweeping is enabled
    pub fn sweep_interval(&self) -> Option<std::time::Duration> {
        match self.retention.sweep_interval_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}
