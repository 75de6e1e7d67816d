pub use sea_orm_migration::prelude::*;

mod m20260901_000001_create_persons_table;
mod m20260901_000002_create_sessions_table;
mod m20260901_000003_create_refresh_tokens_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_create_persons_table::Migration),
            Box::new(m20260901_000002_create_sessions_table::Migration),
            Box::new(m20260901_000003_create_refresh_tokens_table::Migration),
        ]
    }
}
