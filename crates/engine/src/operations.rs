//! Operation primitives.
//!
//! An `Operation` is a signed amount booked on one wallet under one
//! category. `current_balance` freezes the wallet balance as it was right
//! after the operation was applied, so history can be displayed without
//! replaying older operations.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Category, EngineError, Money, Tag, User, Wallet, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: Uuid,
    pub title: String,
    pub amount: Money,
    pub current_balance: Money,
    pub category_id: Uuid,
    pub wallet_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An operation together with everything a listing displays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationView {
    pub operation: Operation,
    pub wallet: Wallet,
    pub category: Category,
    pub author: User,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "operations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub amount: i64,
    pub current_balance: i64,
    pub category_id: String,
    pub wallet_id: String,
    pub author_id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallet,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
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

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        super::operation_tags::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::operation_tags::Relation::Operation.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Operation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "operation")?,
            category_id: parse_uuid(&model.category_id, "category")?,
            wallet_id: parse_uuid(&model.wallet_id, "wallet")?,
            author_id: parse_uuid(&model.author_id, "user")?,
            title: model.title,
            amount: Money::new(model.amount),
            current_balance: Money::new(model.current_balance),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
