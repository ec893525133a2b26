//! Tags attached to operations.
//!
//! Tags are created on the fly from operation input; `title_norm` is the
//! case-insensitive key that makes get-or-create idempotent.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    #[sea_orm(unique)]
    pub title_norm: String,
    pub author_id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Author,
    #[sea_orm(has_many = "super::operation_tags::Entity")]
    OperationTags,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::operations::Entity> for Entity {
    fn to() -> RelationDef {
        super::operation_tags::Relation::Operation.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::operation_tags::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Tag {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "tag")?,
            author_id: parse_uuid(&model.author_id, "user")?,
            title: model.title,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
