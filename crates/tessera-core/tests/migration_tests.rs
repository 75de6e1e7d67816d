use sea_orm_migration::MigratorTrait;
use tessera_core::migrations::Migrator;
use tessera_core::testing::setup_db;

#[tokio::test]
async fn test_migrations_apply_and_roll_back() {
    let db = setup_db().await.unwrap();

    let applied = Migrator::get_applied_migrations(&db).await.unwrap();
    assert_eq!(applied.len(), 3);
    assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());

    Migrator::down(&db, None).await.unwrap();
    assert_eq!(Migrator::get_pending_migrations(&db).await.unwrap().len(), 3);

    Migrator::up(&db, None).await.unwrap();
    assert_eq!(Migrator::get_applied_migrations(&db).await.unwrap().len(), 3);
}
