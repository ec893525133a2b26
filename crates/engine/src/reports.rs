//! Saved reports.
//!
//! A report stores filter criteria only; its operations are listed again
//! on demand through [`Report::filter`].

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, OperationFilter,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub category_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    pub wallet_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// Operation filter equivalent to the saved criteria.
    ///
    /// The listing is always scoped to the report author.
    pub fn filter(&self) -> OperationFilter {
        OperationFilter {
            category: self.category_id,
            tag: self.tag_id,
            wallet: self.wallet_id,
            author: Some(self.author_id),
            date_from: self.date_from,
            date_to: self.date_to,
            operation: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub category_id: Option<String>,
    pub tag_id: Option<String>,
    pub wallet_id: Option<String>,
    pub date_from: Option<DateTimeUtc>,
    pub date_to: Option<DateTimeUtc>,
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
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::tags::Entity",
        from = "Column::TagId",
        to = "super::tags::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Tag,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Wallet,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Report {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "report")?,
            category_id: parse_optional_uuid(model.category_id.as_deref(), "category")?,
            tag_id: parse_optional_uuid(model.tag_id.as_deref(), "tag")?,
            wallet_id: parse_optional_uuid(model.wallet_id.as_deref(), "wallet")?,
            author_id: parse_uuid(&model.author_id, "user")?,
            title: model.title,
            date_from: model.date_from,
            date_to: model.date_to,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
