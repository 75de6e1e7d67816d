use sea_orm_migration::prelude::*;

use super::m20260901_000001_create_persons_table::Persons;
use super::m20260901_000002_create_sessions_table::Sessions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RefreshTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RefreshTokens::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RefreshTokens::PersonId).integer().not_null())
                    .col(ColumnDef::new(RefreshTokens::SessionId).string().not_null())
                    .col(
                        ColumnDef::new(RefreshTokens::TokenHash)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(RefreshTokens::ExpiresAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RefreshTokens::RevokedAt).timestamp().null())
                    .col(ColumnDef::new(RefreshTokens::RotatedAt).timestamp().null())
                    .col(ColumnDef::new(RefreshTokens::ReplacedBy).integer().null())
                    .col(ColumnDef::new(RefreshTokens::UserAgent).string().null())
                    .col(ColumnDef::new(RefreshTokens::Ip).string().null())
                    .col(ColumnDef::new(RefreshTokens::DeviceId).string().null())
                    .col(
                        ColumnDef::new(RefreshTokens::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_refresh_tokens_person")
                            .from(RefreshTokens::Table, RefreshTokens::PersonId)
                            .to(Persons::Table, Persons::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_refresh_tokens_session")
                            .from(RefreshTokens::Table, RefreshTokens::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Backward chain walks look rows up by their successor.
        manager
            .create_index(
                Index::create()
                    .name("idx_refresh_tokens_replaced_by")
                    .table(RefreshTokens::Table)
                    .col(RefreshTokens::ReplacedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_refresh_tokens_person_session")
                    .table(RefreshTokens::Table)
                    .col(RefreshTokens::PersonId)
                    .col(RefreshTokens::SessionId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RefreshTokens::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RefreshTokens {
    Table,
    Id,
    PersonId,
    SessionId,
    TokenHash,
    ExpiresAt,
    RevokedAt,
    RotatedAt,
    ReplacedBy,
    UserAgent,
    Ip,
    DeviceId,
    CreatedAt,
}
