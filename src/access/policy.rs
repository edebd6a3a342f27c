//! # Access Policy Evaluator
//!
//! Decides whether a retrieval may proceed. Rules, first match wins:
//!
//! 1. outside the availability window: denied, for everyone including the owner
//! 2. public without password: granted
//! 3. requester is the owner: granted
//! 4. correct password: granted
//! 5. otherwise denied

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DenialReason;
use super::record::{AccessRule, FileRecord};
use crate::auth::CredentialHasher;

/// Proofs presented with one retrieval request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessProof {
    /// Subject extracted from a verified credential
    pub subject: Option<Uuid>,
    /// Plaintext password as supplied
    pub password: Option<String>,
}

impl AccessProof {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_subject(subject: Uuid) -> Self {
        Self {
            subject: Some(subject),
            password: None,
        }
    }

    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            subject: None,
            password: Some(password.into()),
        }
    }

    fn is_owner_of(&self, owner_id: Option<Uuid>) -> bool {
        matches!((self.subject, owner_id), (Some(subject), Some(owner)) if subject == owner)
    }
}

/// Outcome of an authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Denied(DenialReason),
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

/// Stateless evaluator; safe to share across workers
#[derive(Clone)]
pub struct AccessPolicyEvaluator {
    hasher: Arc<dyn CredentialHasher>,
}

impl AccessPolicyEvaluator {
    pub fn new(hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { hasher }
    }

    pub fn authorize(
        &self,
        record: &FileRecord,
        proof: &AccessProof,
        now: DateTime<Utc>,
    ) -> AccessDecision {
        if !record.is_available_at(now) {
            return AccessDecision::Denied(DenialReason::OutsideAvailabilityWindow);
        }

        let granted = match record.access_rule() {
            AccessRule::Public => true,
            AccessRule::PasswordProtected {
                owner_id,
                password_hash,
            } => {
                proof.is_owner_of(owner_id)
                    || proof
                        .password
                        .as_deref()
                        .map_or(false, |password| self.hasher.check(password, password_hash))
            }
            AccessRule::OwnerOnly { owner_id } => proof.is_owner_of(owner_id),
        };

        if granted {
            AccessDecision::Granted
        } else {
            AccessDecision::Denied(DenialReason::InsufficientProof)
        }
    }
}
