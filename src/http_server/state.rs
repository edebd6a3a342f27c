//! Shared server state

use std::sync::Arc;

use thiserror::Error;

use crate::access::{
    AccessControlEngine, Collaborators, InMemoryMetadataStore, JsonFileMetadataStore,
    MetadataError, MetadataStore,
};
use crate::auth::{
    Argon2Hasher, AuthError, AuthService, InMemoryUserRepository, JsonFileUserRepository,
    JwtManager, PasswordPolicy, UserRepository,
};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::file_storage::{BlobStore, LocalBlobStore};

/// Failure to open the stores behind the server
#[derive(Debug, Error)]
pub enum StateError {
    #[error("metadata store: {0}")]
    Metadata(#[from] MetadataError),

    #[error("account store: {0}")]
    Accounts(#[from] AuthError),
}

/// State shared by every handler
pub struct AppState {
    pub engine: AccessControlEngine,
    pub accounts: AuthService<Arc<dyn UserRepository>>,
    pub clock: Arc<dyn Clock>,
    /// Request body limit on uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Assemble state from explicit stores
    pub fn new(
        config: &Config,
        clock: Arc<dyn Clock>,
        store: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        let jwt = JwtManager::new(config.jwt_config());

        let engine = AccessControlEngine::new(
            config.engine_config(),
            Collaborators {
                clock: Arc::clone(&clock),
                verifier: Arc::new(jwt.clone()),
                hasher: Arc::new(Argon2Hasher),
                store,
                blobs,
            },
        );

        Self {
            engine,
            accounts: AuthService::new(users, jwt, PasswordPolicy::default()),
            clock,
            max_upload_bytes: config.upload.max_request_bytes,
        }
    }

    /// Production wiring: wall clock, blobs under `data_dir`, metadata and
    /// accounts on disk unless disabled
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let (store, users): (Arc<dyn MetadataStore>, Arc<dyn UserRepository>) =
            if config.persist_metadata {
                (
                    Arc::new(JsonFileMetadataStore::open(config.metadata_path())?),
                    Arc::new(JsonFileUserRepository::open(config.users_path())?),
                )
            } else {
                (
                    Arc::new(InMemoryMetadataStore::new()),
                    Arc::new(InMemoryUserRepository::new()),
                )
            };
        let blobs = Arc::new(LocalBlobStore::new(config.blob_dir()));

        Ok(Self::new(config, Arc::new(SystemClock), store, blobs, users))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::UploadCandidate;
    use crate::auth::{LoginRequest, RegisterRequest};
    use tempfile::TempDir;

    fn persistent_config(temp: &TempDir) -> Config {
        let mut config = Config::default();
        config.jwt.secret = "restart-test".to_string();
        config.data_dir = temp.path().to_path_buf();
        config
    }

    fn login(state: &AppState) -> String {
        let (_, issued) = state
            .accounts
            .login(
                LoginRequest {
                    email: "keeper@example.com".to_string(),
                    password: "correct horse battery".to_string(),
                },
                state.clock.now(),
            )
            .unwrap();
        issued.token
    }

    #[test]
    fn test_owner_keeps_private_file_across_restart() {
        let temp = TempDir::new().unwrap();
        let config = persistent_config(&temp);

        let (file_id, owner_id) = {
            let state = AppState::from_config(&config).unwrap();
            let owner = state
                .accounts
                .register(RegisterRequest {
                    username: "keeper".to_string(),
                    email: "keeper@example.com".to_string(),
                    password: "correct horse battery".to_string(),
                })
                .unwrap();
            let credential = login(&state);

            let record = state
                .engine
                .upload(
                    UploadCandidate {
                        is_public: Some(false),
                        ..UploadCandidate::with_payload("owner only")
                    },
                    Some(&credential),
                )
                .unwrap();
            (record.id(), owner.id)
        };

        let restarted = AppState::from_config(&config).unwrap();
        let credential = login(&restarted);
        let file = restarted
            .engine
            .retrieve(&file_id, Some(&credential), None)
            .unwrap();

        assert_eq!(file.record.owner_id(), Some(owner_id));
        assert_eq!(file.data, b"owner only");
    }

    #[test]
    fn test_in_memory_state_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let mut config = persistent_config(&temp);
        config.persist_metadata = false;

        AppState::from_config(&config).unwrap();
        assert!(!config.metadata_path().exists());
        assert!(!config.users_path().exists());
    }
}
