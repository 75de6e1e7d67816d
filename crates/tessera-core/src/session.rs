//! Session registry: one row per login, referenced by id from every token.
//! Sessions and their tokens are never deleted; ending a session revokes.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::error::TesseraError;
use crate::models::{refresh_token, session};

/// Device metadata captured at login.
#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub person_id: i32,
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub platform: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// Create a session record and return its opaque id.
pub async fn create_session(
    db: &DatabaseConnection,
    new_session: NewSession,
) -> Result<String, TesseraError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();

    let model = session::ActiveModel {
        id: Set(id.clone()),
        person_id: Set(new_session.person_id),
        device_id: Set(new_session.device_id),
        device_name: Set(new_session.device_name),
        platform: Set(new_session.platform),
        user_agent: Set(new_session.user_agent),
        ip: Set(new_session.ip),
        created_at: Set(now),
        last_used_at: Set(None),
    };

    model.insert(db).await.map_err(|e| {
        tracing::error!("failed to create session: {}", e);
        e
    })?;
    tracing::debug!("created session {}", id);
    Ok(id)
}

/// End a session (logout): revoke every refresh token issued under it.
///
/// Rows are kept for audit; only `revoked_at` is set, and only on tokens not
/// already revoked. Returns how many tokens were newly revoked. Ending an
/// unknown or already ended session is a no-op.
pub async fn end_session(db: &DatabaseConnection, id: &str) -> Result<u64, TesseraError> {
    let now = Utc::now().naive_utc();
    let result = refresh_token::Entity::update_many()
        .col_expr(refresh_token::Column::RevokedAt, Expr::value(now))
        .filter(refresh_token::Column::SessionId.eq(id))
        .filter(refresh_token::Column::RevokedAt.is_null())
        .exec(db)
        .await
        .map_err(|e| {
            tracing::error!("failed to end session {}: {}", id, e);
            e
        })?;

    tracing::info!(
        session_id = id,
        revoked = result.rows_affected,
        "ended session"
    );
    Ok(result.rows_affected)
}

/// Record that a session was just used, optionally from a new IP.
///
/// Not called by the token engine; callers that want last-used tracking call
/// this with `IssuedTokens::session_id` after a successful refresh.
pub async fn touch_session(
    db: &DatabaseConnection,
    id: &str,
    ip: Option<String>,
) -> Result<bool, TesseraError> {
    let now = Utc::now().naive_utc();
    let mut update = session::Entity::update_many()
        .col_expr(session::Column::LastUsedAt, Expr::value(now))
        .filter(session::Column::Id.eq(id));
    if let Some(ip) = ip {
        update = update.col_expr(session::Column::Ip, Expr::value(ip));
    }

    let result = update.exec(db).await?;
    Ok(result.rows_affected == 1)
}
