use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Principal role, embedded verbatim in access token claims.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Person entity. Owned by the credential store; tessera only reads the
/// identity columns when resolving a refresh token back to its owner.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "persons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// External-facing identifier, used as the token subject
    #[sea_orm(unique)]
    pub public_id: String,

    #[sea_orm(unique)]
    pub email: String,

    pub username: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: Role,

    pub is_active: bool,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Read-only snapshot of a person, borrowed for one token operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Internal storage key
    pub id: i32,
    pub public_id: String,
    pub role: Role,
}

impl From<&Model> for Principal {
    fn from(person: &Model) -> Self {
        Principal {
            id: person.id,
            public_id: person.public_id.clone(),
            role: person.role,
        }
    }
}
