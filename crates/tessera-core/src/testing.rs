//! Test helpers: an in-memory SQLite database with migrations applied,
//! seeded principals/sessions and a ready-to-use engine.
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_issue() {
//!     let harness = TestHarness::new().await;
//!     let (principal, session_id) = harness.seed_login("a@b.com").await;
//!     let pair = harness.engine.issue(&principal, &session_id, IssueMeta::default()).await.unwrap();
//!     assert!(!pair.refresh_token.is_empty());
//! }
//! ```

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::Algorithm;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use crate::auth::TokenEngine;
use crate::config::TokenConfig;
use crate::error::TesseraError;
use crate::migrations::Migrator;
use crate::models::{Principal, Role, person};
use crate::session::{NewSession, create_session};
use crate::store::SeaOrmRefreshTokenStore;

/// Open a fresh in-memory SQLite database and run all migrations.
///
/// The pool is pinned to a single connection: every connection to
/// `sqlite::memory:` would otherwise see its own empty database.
pub async fn setup_db() -> Result<DatabaseConnection, DbErr> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opts).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Signing configuration used throughout the test suite.
pub fn test_token_config() -> TokenConfig {
    TokenConfig {
        secret: "test-secret-key-for-testing".to_string(),
        issuer: "tessera-test".to_string(),
        audience: "tessera-test-clients".to_string(),
        key_id: "test-key".to_string(),
        algorithm: Algorithm::HS256,
        access_ttl_minutes: 15,
        refresh_ttl_days: 30,
    }
}

/// Insert an active person and return its principal snapshot.
pub async fn seed_principal(
    db: &DatabaseConnection,
    email: &str,
    role: Role,
) -> Result<Principal, TesseraError> {
    let now = Utc::now().naive_utc();
    let model = person::ActiveModel {
        public_id: Set(Uuid::new_v4().to_string()),
        email: Set(email.to_string()),
        username: Set(email.split('@').next().unwrap_or(email).to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        role: Set(role),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(Principal::from(&model))
}

/// Insert a session for `person_id` and return its id.
pub async fn seed_session(
    db: &DatabaseConnection,
    person_id: i32,
) -> Result<String, TesseraError> {
    create_session(
        db,
        NewSession {
            person_id,
            device_id: Some("device-1".to_string()),
            device_name: Some("Test device".to_string()),
            platform: Some("web".to_string()),
            user_agent: Some("tessera-tests".to_string()),
            ip: Some("127.0.0.1".to_string()),
        },
    )
    .await
}

/// A database, the store on top of it and an engine using that store.
pub struct TestHarness {
    pub db: DatabaseConnection,
    pub store: Arc<SeaOrmRefreshTokenStore>,
    pub engine: TokenEngine,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_config(test_token_config()).await
    }

    pub async fn with_config(config: TokenConfig) -> Self {
        let db = setup_db().await.expect("Failed to set up test database");
        let store = Arc::new(SeaOrmRefreshTokenStore::new(db.clone()));
        let engine = TokenEngine::new(config, store.clone());
        TestHarness { db, store, engine }
    }

    /// Seed a user principal plus one session, as a login would.
    pub async fn seed_login(&self, email: &str) -> (Principal, String) {
        let principal = seed_principal(&self.db, email, Role::User)
            .await
            .expect("Failed to seed principal");
        let session_id = seed_session(&self.db, principal.id)
            .await
            .expect("Failed to seed session");
        (principal, session_id)
    }
}
