//! The module contains `Wallet` and its table.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    #[default]
    Cash,
    Bank,
    CreditCard,
    Other,
}

impl WalletKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::CreditCard => "credit_card",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for WalletKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            "credit_card" => Ok(Self::CreditCard),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidName(format!(
                "invalid wallet type: {other}"
            ))),
        }
    }
}

/// A wallet.
///
/// A wallet is where money is kept: cash, a bank account, a credit card.
/// Its balance only moves when operations are saved or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub title: String,
    pub kind: WalletKind,
    pub balance: Money,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub kind: String,
    pub balance: i64,
    pub owner_id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owner,
    #[sea_orm(has_many = "super::operations::Entity")]
    Operations,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::operations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Operations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet")?,
            kind: WalletKind::try_from(model.kind.as_str())?,
            balance: Money::new(model.balance),
            owner_id: parse_uuid(&model.owner_id, "user")?,
            title: model.title,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
