use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::auth::jwt::{self, Claims, expiry_after};
use crate::auth::secret::{generate_refresh_secret, hash_secret};
use crate::config::TokenConfig;
use crate::error::TesseraError;
use crate::models::Principal;
use crate::store::{NewRefreshToken, RefreshTokenStore};

/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(3);

/// Provenance captured with every refresh token, for audit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueMeta {
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub device_id: Option<String>,
}

/// An access/refresh pair handed back to the caller.
///
/// `session_id` is echoed so a caller can touch the session after a refresh
/// without looking it up again.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedTokens {
    pub access_token: String,
    pub access_expires_at: NaiveDateTime,
    pub refresh_token: String,
    pub refresh_expires_at: NaiveDateTime,
    pub session_id: String,
}

/// Issues, verifies and rotates credentials.
///
/// Holds no mutable state: configuration is immutable and all persistence
/// goes through the store, so one engine can serve any number of concurrent
/// requests.
#[derive(Clone)]
pub struct TokenEngine {
    config: Arc<TokenConfig>,
    store: Arc<dyn RefreshTokenStore>,
    store_timeout: Duration,
}

impl TokenEngine {
    pub fn new(config: TokenConfig, store: Arc<dyn RefreshTokenStore>) -> Self {
        TokenEngine {
            config: Arc::new(config),
            store,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Override the per-call store deadline.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Run a store call under the deadline. On expiry the future is dropped,
    /// which rolls back any transaction it had open.
    async fn with_deadline<T, F>(&self, op: &str, fut: F) -> Result<T, TesseraError>
    where
        F: Future<Output = Result<T, TesseraError>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("refresh token store call `{}` timed out", op);
                Err(TesseraError::Timeout(format!("store call `{}`", op)))
            }
        }
    }

    fn refresh_expiry(&self, issued_at: DateTime<Utc>) -> Result<NaiveDateTime, TesseraError> {
        let ttl = self.config.refresh_ttl()?;
        Ok(expiry_after(issued_at, ttl)
            .inspect_err(|e| tracing::error!("refresh token expiry: {}", e))?
            .naive_utc())
    }

    /// Issue a fresh access/refresh pair for a verified principal.
    ///
    /// Persists exactly one new refresh token. Nothing is returned unless the
    /// write succeeded.
    pub async fn issue(
        &self,
        principal: &Principal,
        session_id: &str,
        meta: IssueMeta,
    ) -> Result<IssuedTokens, TesseraError> {
        let issued_at = Utc::now();
        let (access_token, claims) =
            jwt::create_token(&self.config, principal, session_id, issued_at)
                .inspect_err(|e| tracing::error!("failed to sign access token: {}", e))?;

        let refresh_token = generate_refresh_secret();
        let refresh_expires_at = self.refresh_expiry(issued_at)?;

        let token_id = self
            .with_deadline(
                "create",
                self.store.create(NewRefreshToken {
                    person_id: principal.id,
                    session_id: session_id.to_string(),
                    token_hash: hash_secret(&refresh_token),
                    expires_at: refresh_expires_at,
                    user_agent: meta.user_agent,
                    ip: meta.ip,
                    device_id: meta.device_id,
                }),
            )
            .await?;

        tracing::info!(
            person_id = principal.id,
            session_id,
            refresh_token_id = token_id,
            "issued token pair"
        );

        Ok(IssuedTokens {
            access_token,
            access_expires_at: access_expiry(&claims)?,
            refresh_token,
            refresh_expires_at,
            session_id: session_id.to_string(),
        })
    }

    /// Verify an access token. Pure: never touches the store.
    pub fn validate_access(&self, token: &str) -> Result<Claims, TesseraError> {
        jwt::validate_token(&self.config, token)
    }

    /// Exchange a refresh secret for a new pair, rotating the old token.
    ///
    /// Unknown, expired, rotated and revoked secrets are indistinguishable to
    /// the caller: all yield [`TesseraError::InvalidCredential`]. A lost race
    /// against a concurrent refresh of the same secret does too. Never retried
    /// here.
    pub async fn refresh(
        &self,
        presented: &str,
        meta: IssueMeta,
    ) -> Result<IssuedTokens, TesseraError> {
        if presented.trim().is_empty() {
            return Err(TesseraError::BadRequest("missing refresh token".to_string()));
        }

        let now = Utc::now();
        let hash = hash_secret(presented);
        let Some(current) = self
            .with_deadline(
                "find_active_by_hash",
                self.store.find_active_by_hash(&hash, now.naive_utc()),
            )
            .await?
        else {
            // A superseded secret cannot be told apart from garbage here, so
            // reuse is not detected on this path.
            tracing::warn!("refresh attempted with unknown, expired or superseded token");
            return Err(TesseraError::InvalidCredential);
        };

        let principal = current.principal();
        let (access_token, claims) =
            jwt::create_token(&self.config, &principal, &current.session_id, now)
                .inspect_err(|e| tracing::error!("failed to sign access token: {}", e))?;

        let refresh_token = generate_refresh_secret();
        let refresh_expires_at = self.refresh_expiry(now)?;

        let rotated = self
            .with_deadline(
                "rotate_create_next",
                self.store.rotate_create_next(
                    current.id,
                    NewRefreshToken {
                        person_id: current.person_id,
                        session_id: current.session_id.clone(),
                        token_hash: hash_secret(&refresh_token),
                        expires_at: refresh_expires_at,
                        user_agent: meta.user_agent,
                        ip: meta.ip,
                        device_id: meta.device_id,
                    },
                ),
            )
            .await;

        let successor_id = match rotated {
            Ok(id) => id,
            Err(TesseraError::Conflict(reason)) => {
                tracing::warn!(
                    refresh_token_id = current.id,
                    "lost refresh rotation race: {}",
                    reason
                );
                return Err(TesseraError::InvalidCredential);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            person_id = current.person_id,
            session_id = %current.session_id,
            rotated_from = current.id,
            rotated_to = successor_id,
            "rotated refresh token"
        );

        Ok(IssuedTokens {
            access_token,
            access_expires_at: access_expiry(&claims)?,
            refresh_token,
            refresh_expires_at,
            session_id: current.session_id,
        })
    }

    /// Revoke the active refresh token behind a presented secret (logout).
    ///
    /// A secret that matches no active token is a no-op.
    pub async fn revoke(&self, presented: &str) -> Result<(), TesseraError> {
        if presented.trim().is_empty() {
            return Err(TesseraError::BadRequest("missing refresh token".to_string()));
        }

        let hash = hash_secret(presented);
        let found = self
            .with_deadline(
                "find_active_by_hash",
                self.store
                    .find_active_by_hash(&hash, Utc::now().naive_utc()),
            )
            .await?;

        if let Some(current) = found {
            self.with_deadline("revoke_by_id", self.store.revoke_by_id(current.id))
                .await?;
            tracing::info!(
                person_id = current.person_id,
                session_id = %current.session_id,
                refresh_token_id = current.id,
                "revoked refresh token"
            );
        }
        Ok(())
    }

    /// Revoke the whole rotation chain containing `token_id`, including its
    /// currently active token.
    ///
    /// For callers that detect reuse out of band: once any secret of a chain
    /// leaks, every token in that chain is compromised.
    pub async fn mark_reuse_and_revoke_chain(&self, token_id: i32) -> Result<u64, TesseraError> {
        self.with_deadline(
            "mark_reuse_and_revoke_chain",
            self.store.mark_reuse_and_revoke_chain(token_id),
        )
        .await
    }
}

fn access_expiry(claims: &Claims) -> Result<NaiveDateTime, TesseraError> {
    DateTime::from_timestamp(claims.exp, 0)
        .map(|exp| exp.naive_utc())
        .ok_or_else(|| TesseraError::Internal("access token expiry out of range".to_string()))
}
