//! Refresh token persistence.
//!
//! The token engine only talks to storage through [`RefreshTokenStore`], and
//! only with the plain records defined here.

mod database;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::TesseraError;
use crate::models::{Principal, Role, refresh_token};

pub use database::SeaOrmRefreshTokenStore;

/// Fields persisted for a newly minted refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefreshToken {
    pub person_id: i32,
    pub session_id: String,
    pub token_hash: String,
    pub expires_at: NaiveDateTime,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub device_id: Option<String>,
}

/// An active refresh token joined with its owner's identity columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenLookup {
    pub id: i32,
    pub person_id: i32,
    pub session_id: String,
    pub expires_at: NaiveDateTime,
    pub person_public_id: String,
    pub person_role: Role,
}

impl RefreshTokenLookup {
    /// Minimal principal snapshot, without a round trip to the credential store.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.person_id,
            public_id: self.person_public_id.clone(),
            role: self.person_role,
        }
    }
}

/// Full audit view of one refresh token row. The hash is not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshTokenRecord {
    pub id: i32,
    pub person_id: i32,
    pub session_id: String,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub rotated_at: Option<NaiveDateTime>,
    pub replaced_by: Option<i32>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub device_id: Option<String>,
    pub created_at: NaiveDateTime,
}

impl RefreshTokenRecord {
    /// Active iff neither revoked nor rotated and `expires_at > now` (strict).
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.revoked_at.is_none() && self.rotated_at.is_none() && self.expires_at > now
    }
}

impl From<refresh_token::Model> for RefreshTokenRecord {
    fn from(model: refresh_token::Model) -> Self {
        RefreshTokenRecord {
            id: model.id,
            person_id: model.person_id,
            session_id: model.session_id,
            expires_at: model.expires_at,
            revoked_at: model.revoked_at,
            rotated_at: model.rotated_at,
            replaced_by: model.replaced_by,
            user_agent: model.user_agent,
            ip: model.ip,
            device_id: model.device_id,
            created_at: model.created_at,
        }
    }
}

/// Persistence contract consumed by the token engine.
#[async_trait::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Insert a new active token and return its id.
    async fn create(&self, token: NewRefreshToken) -> Result<i32, TesseraError>;

    /// Revoke one token. No-op if it is absent or already revoked.
    async fn revoke_by_id(&self, id: i32) -> Result<(), TesseraError>;

    /// Find the active token with this hash. `Ok(None)` when nothing matches.
    async fn find_active_by_hash(
        &self,
        token_hash: &str,
        now: NaiveDateTime,
    ) -> Result<Option<RefreshTokenLookup>, TesseraError>;

    /// Insert `next` and mark `old_id` rotated with `replaced_by = next`,
    /// atomically. Returns [`TesseraError::Conflict`] (and persists nothing)
    /// when `old_id` is no longer rotatable.
    async fn rotate_create_next(
        &self,
        old_id: i32,
        next: NewRefreshToken,
    ) -> Result<i32, TesseraError>;

    /// Revoke every token of the rotation chain containing `id`, atomically.
    /// Returns how many rows were newly revoked.
    async fn mark_reuse_and_revoke_chain(&self, id: i32) -> Result<u64, TesseraError>;

    /// The rotation chain containing `id`, root first. Empty if `id` is unknown.
    async fn chain(&self, id: i32) -> Result<Vec<RefreshTokenRecord>, TesseraError>;
}
