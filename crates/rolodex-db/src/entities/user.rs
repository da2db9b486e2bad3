//! Identity entity: registered accounts that can log in

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Identity UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email, stored trimmed and lowercased (unique)
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Optional home city
    pub city: Option<String>,

    /// When the account was created
    pub created_at: ChronoDateTimeUtc,

    /// When the account was last updated
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Identity owns contacts
    #[sea_orm(has_many = "super::contact::Entity")]
    Contacts,

    /// Identity owns managed user records
    #[sea_orm(has_many = "super::managed_user::Entity")]
    ManagedUsers,
}

impl Related<super::contact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contacts.def()
    }
}

impl Related<super::managed_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManagedUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
