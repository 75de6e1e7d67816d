use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One authenticated device/client instance. Created once per login.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Opaque identifier carried in the `sid` claim
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub person_id: i32,

    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub platform: Option<String>,
    pub user_agent: Option<String>,

    /// Originating IP
    pub ip: Option<String>,

    pub created_at: NaiveDateTime,

    /// Not maintained by the token engine; see `session::touch_session`
    pub last_used_at: Option<NaiveDateTime>,
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
}

impl Related<super::person::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Person.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
