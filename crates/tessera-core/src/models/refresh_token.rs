use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Refresh token entity. Rows are never deleted; rotation links each row to
/// its successor through `replaced_by`, forming the rotation chain.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// The person who owns this refresh token
    pub person_id: i32,

    pub session_id: String,

    /// SHA-256 of the opaque secret; the secret itself is never stored
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub token_hash: String,

    pub expires_at: NaiveDateTime,

    /// Set once, never cleared
    pub revoked_at: Option<NaiveDateTime>,

    /// Set together with `replaced_by` when exchanged for a successor
    pub rotated_at: Option<NaiveDateTime>,
    pub replaced_by: Option<i32>,

    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub device_id: Option<String>,

    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::PersonId",
        to = "super::person::Column::Id",
        on_delete = "Restrict"
    )]
    Person,
    #[sea_orm(
        belongs_to = "super::session::Entity",
        from = "Column::SessionId",
        to = "super::session::Column::Id",
        on_delete = "Restrict"
    )]
    Session,
}

impl Related<super::person::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Person.def()
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
