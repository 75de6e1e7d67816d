use std::collections::HashSet;

use chrono::{NaiveDateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set, SqlErr, TransactionTrait,
};

use super::{NewRefreshToken, RefreshTokenLookup, RefreshTokenRecord, RefreshTokenStore};
use crate::error::TesseraError;
use crate::models::{person, refresh_token};

/// [`RefreshTokenStore`] backed by a sea-orm connection (SQLite or Postgres).
#[derive(Clone)]
pub struct SeaOrmRefreshTokenStore {
    db: DatabaseConnection,
}

impl SeaOrmRefreshTokenStore {
    pub fn new(db: DatabaseConnection) -> Self {
        SeaOrmRefreshTokenStore { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn active_model(token: NewRefreshToken, now: NaiveDateTime) -> refresh_token::ActiveModel {
    refresh_token::ActiveModel {
        person_id: Set(token.person_id),
        session_id: Set(token.session_id),
        token_hash: Set(token.token_hash),
        expires_at: Set(token.expires_at),
        revoked_at: Set(None),
        rotated_at: Set(None),
        replaced_by: Set(None),
        user_agent: Set(token.user_agent),
        ip: Set(token.ip),
        device_id: Set(token.device_id),
        created_at: Set(now),
        ..Default::default()
    }
}

/// A duplicate hash means two secrets collided, which must not happen.
fn map_insert_error(err: DbErr) -> TesseraError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::error!("refresh token hash collision: {}", detail);
            TesseraError::Integrity("duplicate refresh token hash".to_string())
        }
        _ => {
            tracing::error!("failed to insert refresh token: {}", err);
            TesseraError::Database(err)
        }
    }
}

/// Load the whole chain containing `id`, root first.
///
/// Walks back to the root through `replaced_by` back-references, then forward
/// again. Iterative with a visited set so a corrupt cycle cannot loop forever.
/// Rows are locked for update where the backend supports it.
async fn load_chain<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Vec<refresh_token::Model>, DbErr> {
    let Some(start) = refresh_token::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
    else {
        return Ok(Vec::new());
    };

    let mut visited = HashSet::from([start.id]);
    let mut root = start;
    while let Some(prev) = refresh_token::Entity::find()
        .filter(refresh_token::Column::ReplacedBy.eq(root.id))
        .lock_exclusive()
        .one(conn)
        .await?
    {
        if !visited.insert(prev.id) {
            break;
        }
        root = prev;
    }

    let mut visited = HashSet::from([root.id]);
    let mut cursor = root.replaced_by;
    let mut chain = vec![root];
    while let Some(next_id) = cursor {
        if !visited.insert(next_id) {
            break;
        }
        let Some(next) = refresh_token::Entity::find_by_id(next_id)
            .lock_exclusive()
            .one(conn)
            .await?
        else {
            break;
        };
        cursor = next.replaced_by;
        chain.push(next);
    }

    Ok(chain)
}

#[async_trait::async_trait]
impl RefreshTokenStore for SeaOrmRefreshTokenStore {
    async fn create(&self, token: NewRefreshToken) -> Result<i32, TesseraError> {
        let now = Utc::now().naive_utc();
        let model = active_model(token, now)
            .insert(&self.db)
            .await
            .map_err(map_insert_error)?;
        Ok(model.id)
    }

    async fn revoke_by_id(&self, id: i32) -> Result<(), TesseraError> {
        let now = Utc::now().naive_utc();
        let result = refresh_token::Entity::update_many()
            .col_expr(refresh_token::Column::RevokedAt, Expr::value(now))
            .filter(refresh_token::Column::Id.eq(id))
            .filter(refresh_token::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("failed to revoke refresh token {}: {}", id, e);
                e
            })?;

        if result.rows_affected == 0 {
            tracing::debug!("no refresh token revoked (not found or already revoked): {}", id);
        }
        Ok(())
    }

    async fn find_active_by_hash(
        &self,
        token_hash: &str,
        now: NaiveDateTime,
    ) -> Result<Option<RefreshTokenLookup>, TesseraError> {
        let found = refresh_token::Entity::find()
            .filter(refresh_token::Column::TokenHash.eq(token_hash))
            .filter(refresh_token::Column::RevokedAt.is_null())
            .filter(refresh_token::Column::RotatedAt.is_null())
            .filter(refresh_token::Column::ExpiresAt.gt(now))
            .find_also_related(person::Entity)
            .one(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("failed to look up refresh token by hash: {}", e);
                e
            })?;

        Ok(match found {
            Some((token, Some(owner))) => Some(RefreshTokenLookup {
                id: token.id,
                person_id: token.person_id,
                session_id: token.session_id,
                expires_at: token.expires_at,
                person_public_id: owner.public_id,
                person_role: owner.role,
            }),
            Some((token, None)) => {
                tracing::warn!("refresh token {} has no owning person", token.id);
                None
            }
            None => None,
        })
    }

    async fn rotate_create_next(
        &self,
        old_id: i32,
        next: NewRefreshToken,
    ) -> Result<i32, TesseraError> {
        let now = Utc::now().naive_utc();
        // Dropping `txn` without commit rolls back, including on cancellation.
        let txn = self.db.begin().await?;

        let successor = active_model(next, now)
            .insert(&txn)
            .await
            .map_err(map_insert_error)?;

        let result = refresh_token::Entity::update_many()
            .col_expr(refresh_token::Column::RotatedAt, Expr::value(now))
            .col_expr(refresh_token::Column::ReplacedBy, Expr::value(successor.id))
            .filter(refresh_token::Column::Id.eq(old_id))
            .filter(refresh_token::Column::RotatedAt.is_null())
            .filter(refresh_token::Column::RevokedAt.is_null())
            .exec(&txn)
            .await
            .map_err(|e| {
                tracing::error!("failed to mark refresh token {} as rotated: {}", old_id, e);
                e
            })?;

        if result.rows_affected != 1 {
            txn.rollback().await?;
            return Err(TesseraError::Conflict(format!(
                "refresh token {} is no longer active",
                old_id
            )));
        }

        txn.commit().await?;
        Ok(successor.id)
    }

    async fn mark_reuse_and_revoke_chain(&self, id: i32) -> Result<u64, TesseraError> {
        let txn = self.db.begin().await?;

        let chain = load_chain(&txn, id).await?;
        if chain.is_empty() {
            tracing::debug!("no refresh token chain found for {}", id);
            return Ok(0);
        }

        let ids: Vec<i32> = chain.iter().map(|token| token.id).collect();
        let now = Utc::now().naive_utc();
        let result = refresh_token::Entity::update_many()
            .col_expr(refresh_token::Column::RevokedAt, Expr::value(now))
            .filter(refresh_token::Column::Id.is_in(ids))
            .filter(refresh_token::Column::RevokedAt.is_null())
            .exec(&txn)
            .await
            .map_err(|e| {
                tracing::error!("failed to revoke refresh chain of {}: {}", id, e);
                e
            })?;

        txn.commit().await?;

        tracing::warn!(
            token_id = id,
            chain_len = chain.len(),
            revoked = result.rows_affected,
            "revoked refresh token chain"
        );
        Ok(result.rows_affected)
    }

    async fn chain(&self, id: i32) -> Result<Vec<RefreshTokenRecord>, TesseraError> {
        let chain = load_chain(&self.db, id).await?;
        Ok(chain.into_iter().map(RefreshTokenRecord::from).collect())
    }
}
