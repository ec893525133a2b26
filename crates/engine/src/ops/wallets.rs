use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, Money, Page, ResultEngine, Wallet, WalletKind, operations,
    pagination::fetch_page, users, util::normalize_title, wallets,
};

use super::{Engine, with_tx};

/// Fields of a wallet a caller can set.
///
/// `balance` is the opening balance and is only read when the wallet is
/// created; later changes go through operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletInput {
    pub id: Option<Uuid>,
    pub title: String,
    pub kind: WalletKind,
    pub balance: Money,
    pub owner_id: Uuid,
}

impl Engine {
    /// Create or update a wallet.
    pub async fn save_wallet(&self, input: WalletInput) -> ResultEngine<Wallet> {
        let title = normalize_title(&input.title, "wallet")?;
        let opening = Money::checked(input.balance.cents())?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let model = match input.id {
                Some(id) => {
                    let existing = wallets::Entity::find_by_id(id.to_string())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
                    let mut active: wallets::ActiveModel = existing.into();
                    active.title = ActiveValue::Set(title);
                    active.kind = ActiveValue::Set(input.kind.as_str().to_string());
                    active.updated_at = ActiveValue::Set(now);
                    active.update(&db_tx).await?
                }
                None => {
                    users::Entity::find_by_id(input.owner_id.to_string())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
                    let model = wallets::ActiveModel {
                        id: ActiveValue::Set(Uuid::new_v4().to_string()),
                        title: ActiveValue::Set(title),
                        kind: ActiveValue::Set(input.kind.as_str().to_string()),
                        balance: ActiveValue::Set(opening.cents()),
                        owner_id: ActiveValue::Set(input.owner_id.to_string()),
                        created_at: ActiveValue::Set(now),
                        updated_at: ActiveValue::Set(now),
                    }
                    .insert(&db_tx)
                    .await?;
                    tracing::info!(wallet = %model.id, owner = %model.owner_id, "wallet created");
                    model
                }
            };
            Wallet::try_from(model)
        })
    }

    /// Delete a wallet that no operation is booked on.
    pub async fn delete_wallet(&self, wallet_id: Uuid) -> ResultEngine<()> {
        let id = wallet_id.to_string();
        with_tx!(self, |db_tx| {
            let model = wallets::Entity::find_by_id(id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;

            let booked = operations::Entity::find()
                .filter(operations::Column::WalletId.eq(id.clone()))
                .count(&db_tx)
                .await?;
            if booked > 0 {
                return Err(EngineError::InUse(format!(
                    "wallet '{}' has {booked} operations",
                    model.title
                )));
            }

            wallets::Entity::delete_by_id(id.clone())
                .exec(&db_tx)
                .await?;
            tracing::info!(wallet = %id, "wallet deleted");
            Ok(())
        })
    }

    /// Wallets owned by `owner_id`, most recently updated first.
    pub async fn wallets_page(&self, page: u64, owner_id: Uuid) -> ResultEngine<Page<Wallet>> {
        let select = wallets::Entity::find()
            .filter(wallets::Column::OwnerId.eq(owner_id.to_string()))
            .order_by_desc(wallets::Column::UpdatedAt)
            .order_by_desc(wallets::Column::Id);
        fetch_page(&self.database, select, page, self.page_size)
            .await?
            .try_map(Wallet::try_from)
    }

    pub async fn wallet_by_id(&self, wallet_id: Uuid) -> ResultEngine<Option<Wallet>> {
        wallets::Entity::find_by_id(wallet_id.to_string())
            .one(&self.database)
            .await?
            .map(Wallet::try_from)
            .transpose()
    }
}

/// Add `delta` to a wallet balance in one statement and return the new
/// balance.
///
/// With a `floor`, the update only matches when the resulting balance stays
/// at or above it, so the check and the write cannot interleave with
/// another save.
pub(super) async fn shift_wallet_balance<C: ConnectionTrait>(
    db: &C,
    wallet_id: &str,
    delta: Money,
    floor: Option<Money>,
) -> ResultEngine<Money> {
    if !delta.is_zero() {
        let mut update = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::Balance,
                Expr::col(wallets::Column::Balance).add(delta.cents()),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallets::Column::Id.eq(wallet_id));
        if let Some(floor) = floor {
            update = update.filter(
                Expr::expr(Expr::col(wallets::Column::Balance).add(delta.cents()))
                    .gte(floor.cents()),
            );
        }

        let result = update.exec(db).await?;
        if result.rows_affected != 1 {
            let exists = wallets::Entity::find_by_id(wallet_id.to_string())
                .one(db)
                .await?
                .is_some();
            if !exists {
                return Err(EngineError::KeyNotFound("wallet not exists".to_string()));
            }
            return Err(EngineError::InsufficientFunds(format!(
                "balance would drop below {}",
                floor.unwrap_or_default()
            )));
        }
    }

    let model = wallets::Entity::find_by_id(wallet_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
    Money::checked(model.balance)
}
