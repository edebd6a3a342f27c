//! # Upload Validator
//!
//! Decides whether an upload is well-formed before anything is hashed or
//! written. Checks run in a fixed order and the first failure wins:
//!
//! 1. payload present and non-empty
//! 2. password, if any, long enough
//! 3. availability bounds ordered
//! 4. a private upload has a password or a verified uploader

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::errors::ValidationError;
use super::record::{FileDraft, Visibility};
use crate::auth::{AuthResult, CredentialHasher, PasswordPolicy};

const DEFAULT_FILE_NAME: &str = "unnamed";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Raw upload fields as received from the caller
#[derive(Debug, Clone, Default)]
pub struct UploadCandidate {
    pub payload: Option<Vec<u8>>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub password: Option<String>,
    /// Defaults to public when absent
    pub is_public: Option<bool>,
    pub available_from: Option<DateTime<Utc>>,
    pub available_to: Option<DateTime<Utc>>,
}

impl UploadCandidate {
    pub fn with_payload(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Some(payload.into()),
            ..Default::default()
        }
    }
}

/// An upload that passed every check, with normalized fields
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    payload: Vec<u8>,
    file_name: String,
    content_type: String,
    password: Option<String>,
    visibility: Visibility,
    owner_id: Option<Uuid>,
    available_from: Option<DateTime<Utc>>,
    available_to: Option<DateTime<Utc>>,
}

impl ValidatedUpload {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    /// Replace the plaintext password with its hash
    pub fn seal(self, hasher: &dyn CredentialHasher) -> AuthResult<SealedUpload> {
        let password_hash = match &self.password {
            Some(plaintext) => Some(hasher.hash(plaintext)?),
            None => None,
        };
        let checksum = format!("{:x}", Sha256::digest(&self.payload));

        Ok(SealedUpload {
            payload: self.payload,
            draft: FileDraft {
                owner_id: self.owner_id,
                storage_ref: String::new(),
                visibility: self.visibility,
                password_hash,
                available_from: self.available_from,
                available_to: self.available_to,
                size: 0,
                file_name: self.file_name,
                content_type: self.content_type,
                checksum,
            },
        })
    }
}

/// A validated upload whose password is hashed; ready for the blob store
#[derive(Debug)]
pub struct SealedUpload {
    payload: Vec<u8>,
    draft: FileDraft,
}

impl SealedUpload {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Attach the blob reference, dropping the payload
    pub fn into_draft(self, storage_ref: String) -> FileDraft {
        FileDraft {
            storage_ref,
            size: self.payload.len() as u64,
            ..self.draft
        }
    }
}

/// Stateless upload checker
#[derive(Debug, Clone)]
pub struct UploadValidator {
    password_policy: PasswordPolicy,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(6)
    }
}

impl UploadValidator {
    pub fn new(min_password_length: usize) -> Self {
        Self {
            password_policy: PasswordPolicy::with_min_length(min_password_length),
        }
    }

    /// Validate a candidate; `owner_id` is the already-verified uploader, if any
    pub fn validate(
        &self,
        candidate: UploadCandidate,
        owner_id: Option<Uuid>,
    ) -> Result<ValidatedUpload, ValidationError> {
        let payload = match candidate.payload {
            Some(payload) if !payload.is_empty() => payload,
            _ => return Err(ValidationError::MissingFile),
        };

        if let Some(password) = &candidate.password {
            if !self.password_policy.is_satisfied_by(password) {
                return Err(ValidationError::WeakPassword {
                    min_length: self.password_policy.min_length,
                });
            }
        }

        if let (Some(from), Some(to)) = (candidate.available_from, candidate.available_to) {
            if from >= to {
                return Err(ValidationError::InvalidDateRange);
            }
        }

        let visibility = Visibility::from_is_public(candidate.is_public.unwrap_or(true));
        if visibility == Visibility::Private && candidate.password.is_none() && owner_id.is_none() {
            return Err(ValidationError::UnauthorizedPrivateUpload);
        }

        Ok(ValidatedUpload {
            payload,
            file_name: non_blank(candidate.file_name).unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
            content_type: non_blank(candidate.content_type)
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            password: candidate.password,
            visibility,
            owner_id,
            available_from: candidate.available_from,
            available_to: candidate.available_to,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Argon2Hasher;
    use chrono::Duration;

    fn validator() -> UploadValidator {
        UploadValidator::default()
    }

    #[test]
    fn test_missing_and_empty_payload() {
        let v = validator();
        assert_eq!(
            v.validate(UploadCandidate::default(), None).unwrap_err(),
            ValidationError::MissingFile
        );
        assert_eq!(
            v.validate(UploadCandidate::with_payload(Vec::new()), None)
                .unwrap_err(),
            ValidationError::MissingFile
        );
    }

    #[test]
    fn test_missing_file_wins_over_other_failures() {
        let candidate = UploadCandidate {
            password: Some("123".to_string()),
            is_public: Some(false),
            ..Default::default()
        };
        assert_eq!(
            validator().validate(candidate, None).unwrap_err(),
            ValidationError::MissingFile
        );
    }

    #[test]
    fn test_password_length_boundary() {
        let v = validator();
        for (password, ok) in [("12345", false), ("123456", true), ("", false)] {
            let candidate = UploadCandidate {
                password: Some(password.to_string()),
                ..UploadCandidate::with_payload("hello")
            };
            let result = v.validate(candidate, None);
            if ok {
                assert!(result.is_ok());
            } else {
                assert_eq!(
                    result.unwrap_err(),
                    ValidationError::WeakPassword { min_length: 6 }
                );
            }
        }
    }

    #[test]
    fn test_date_range_must_be_strictly_ordered() {
        let now = Utc::now();
        let v = validator();

        let reversed = UploadCandidate {
            available_from: Some(now + Duration::hours(24)),
            available_to: Some(now),
            ..UploadCandidate::with_payload("hello")
        };
        assert_eq!(
            v.validate(reversed, None).unwrap_err(),
            ValidationError::InvalidDateRange
        );

        let equal = UploadCandidate {
            available_from: Some(now),
            available_to: Some(now),
            ..UploadCandidate::with_payload("hello")
        };
        assert_eq!(
            v.validate(equal, None).unwrap_err(),
            ValidationError::InvalidDateRange
        );

        let open_ended = UploadCandidate {
            available_from: Some(now + Duration::hours(24)),
            ..UploadCandidate::with_payload("hello")
        };
        assert!(v.validate(open_ended, None).is_ok());
    }

    #[test]
    fn test_private_upload_needs_password_or_owner() {
        let v = validator();
        let private = UploadCandidate {
            is_public: Some(false),
            ..UploadCandidate::with_payload("secret")
        };

        assert_eq!(
            v.validate(private.clone(), None).unwrap_err(),
            ValidationError::UnauthorizedPrivateUpload
        );

        let owned = v.validate(private.clone(), Some(Uuid::new_v4())).unwrap();
        assert_eq!(owned.visibility(), Visibility::Private);

        let with_password = UploadCandidate {
            password: Some("123456".to_string()),
            ..private
        };
        assert!(v.validate(with_password, None).is_ok());
    }

    #[test]
    fn test_defaults_are_normalized() {
        let validated = validator()
            .validate(
                UploadCandidate {
                    file_name: Some("   ".to_string()),
                    ..UploadCandidate::with_payload("x")
                },
                None,
            )
            .unwrap();

        assert_eq!(validated.visibility(), Visibility::Public);
        assert_eq!(validated.file_name, DEFAULT_FILE_NAME);
        assert_eq!(validated.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_seal_hashes_password_and_sizes_payload() {
        let hasher = Argon2Hasher;
        let validated = validator()
            .validate(
                UploadCandidate {
                    password: Some("123456".to_string()),
                    ..UploadCandidate::with_payload("hello world")
                },
                None,
            )
            .unwrap();

        let sealed = validated.seal(&hasher).unwrap();
        assert_eq!(sealed.payload(), b"hello world");

        let record = sealed
            .into_draft("blob-1".to_string())
            .into_record(Uuid::new_v4(), Utc::now());
        assert_eq!(record.size(), 11);
        assert_eq!(record.storage_ref(), "blob-1");
        assert_eq!(record.checksum().len(), 64);

        let hash = record.password_hash().unwrap();
        assert_ne!(hash, "123456");
        assert!(hasher.check("123456", hash));
    }
}
