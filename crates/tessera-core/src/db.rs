use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection};
use std::time::Duration;

use crate::config::Config;

/// Initialize the database connection from config.
pub async fn connect(config: &Config) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let db = &config.database;
    let mut opts = ConnectOptions::new(&db.url);
    opts.max_connections(db.max_connections)
        .min_connections(db.min_connections.min(db.max_connections))
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(db.max_lifetime_secs))
        .sqlx_logging(config.is_dev());

    SeaDatabase::connect(opts).await
}
