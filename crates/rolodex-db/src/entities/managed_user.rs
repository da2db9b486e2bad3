//! Managed user record: a name/city directory entry kept by an identity
//!
//! These are not login accounts. Listing and search are public, while
//! changes are restricted to the identity recorded in `owner_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "managed_users")]
pub struct Model {
    /// Record UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Identity that created the record
    pub owner_id: Uuid,

    /// Trimmed name, 2 to 100 characters
    pub name: String,

    /// Trimmed city name
    pub city: String,

    /// When the record was created
    pub created_at: ChronoDateTimeUtc,

    /// When the record was last updated
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Record belongs to its owning identity
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Owner,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
