use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, ConnectionTrait, LoaderTrait, QueryFilter, TransactionTrait, prelude::*,
};

use crate::{
    Category, EngineError, Money, Operation, OperationFilter, OperationView, Page, ResultEngine,
    Tag, User, Wallet, categories,
    filter::{ApplyOperationFilters, base_query},
    operation_tags, operations,
    pagination::fetch_page,
    tags, users,
    util::{normalize_title, parse_uuid, split_tag_titles},
    wallets,
};

use super::{Engine, tags::get_or_create, wallets::shift_wallet_balance, with_tx};

/// Fields of an operation a caller can set.
///
/// `tags` is free text: comma separated titles, matched case-insensitively
/// against existing tags and created when missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationInput {
    pub id: Option<Uuid>,
    pub title: String,
    pub amount: Money,
    pub category_id: Uuid,
    pub wallet_id: Uuid,
    /// Ignored on update; an operation keeps its author.
    pub author_id: Uuid,
    pub tags: String,
}

impl Engine {
    /// Create or update an operation and move the wallet balance with it.
    ///
    /// On update the previous amount is taken back from the previous wallet
    /// before the new amount is applied. Either way the stored
    /// `current_balance` is the wallet balance right after this save.
    pub async fn save_operation(&self, input: OperationInput) -> ResultEngine<Operation> {
        let title = normalize_title(&input.title, "operation")?;
        let amount = Money::checked(input.amount.cents())?;
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "amount must not be zero".to_string(),
            ));
        }
        let tag_titles = split_tag_titles(&input.tags);
        let category_id = input.category_id.to_string();
        let wallet_id = input.wallet_id.to_string();
        let floor = Some(self.balance_floor);
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            categories::Entity::find_by_id(category_id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;

            let model = match input.id {
                Some(id) => {
                    let existing = operations::Entity::find_by_id(id.to_string())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| {
                            EngineError::KeyNotFound("operation not exists".to_string())
                        })?;

                    let balance = if existing.wallet_id == wallet_id {
                        let delta = amount - Money::new(existing.amount);
                        shift_wallet_balance(&db_tx, &wallet_id, delta, floor).await?
                    } else {
                        shift_wallet_balance(
                            &db_tx,
                            &existing.wallet_id,
                            -Money::new(existing.amount),
                            floor,
                        )
                        .await?;
                        shift_wallet_balance(&db_tx, &wallet_id, amount, floor).await?
                    };

                    let mut active: operations::ActiveModel = existing.into();
                    active.title = ActiveValue::Set(title);
                    active.amount = ActiveValue::Set(amount.cents());
                    active.current_balance = ActiveValue::Set(balance.cents());
                    active.category_id = ActiveValue::Set(category_id.clone());
                    active.wallet_id = ActiveValue::Set(wallet_id.clone());
                    active.updated_at = ActiveValue::Set(now);
                    active.update(&db_tx).await?
                }
                None => {
                    users::Entity::find_by_id(input.author_id.to_string())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
                    let balance = shift_wallet_balance(&db_tx, &wallet_id, amount, floor).await?;

                    operations::ActiveModel {
                        id: ActiveValue::Set(Uuid::new_v4().to_string()),
                        title: ActiveValue::Set(title),
                        amount: ActiveValue::Set(amount.cents()),
                        current_balance: ActiveValue::Set(balance.cents()),
                        category_id: ActiveValue::Set(category_id.clone()),
                        wallet_id: ActiveValue::Set(wallet_id.clone()),
                        author_id: ActiveValue::Set(input.author_id.to_string()),
                        created_at: ActiveValue::Set(now),
                        updated_at: ActiveValue::Set(now),
                    }
                    .insert(&db_tx)
                    .await?
                }
            };

            let author_id = parse_uuid(&model.author_id, "user")?;
            replace_tags(&db_tx, &model.id, &tag_titles, author_id, now).await?;
            tracing::info!(
                operation = %model.id,
                wallet = %model.wallet_id,
                amount = model.amount,
                balance = model.current_balance,
                "operation saved"
            );
            Operation::try_from(model)
        })
    }

    /// Delete an operation and take its amount back from the wallet.
    ///
    /// Reverting is never refused by the balance floor.
    pub async fn delete_operation(&self, operation_id: Uuid) -> ResultEngine<()> {
        let id = operation_id.to_string();
        with_tx!(self, |db_tx| {
            let model = operations::Entity::find_by_id(id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("operation not exists".to_string()))?;

            shift_wallet_balance(&db_tx, &model.wallet_id, -Money::new(model.amount), None)
                .await?;
            operation_tags::Entity::delete_many()
                .filter(operation_tags::Column::OperationId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            operations::Entity::delete_by_id(id.clone())
                .exec(&db_tx)
                .await?;
            tracing::info!(operation = %id, "operation deleted");
            Ok(())
        })
    }

    /// One page of operations matching `filter`, most recently updated
    /// first.
    pub async fn operations_page(
        &self,
        page: u64,
        filter: &OperationFilter,
    ) -> ResultEngine<Page<OperationView>> {
        filter.validate()?;
        let select = base_query().apply_operation_filters(filter);
        let Page {
            items,
            page,
            page_size,
            total_items,
            total_pages,
        } = fetch_page(&self.database, select, page, self.page_size).await?;
        tracing::debug!(page, total_items, "operations listed");

        Ok(Page {
            items: load_views(&self.database, items).await?,
            page,
            page_size,
            total_items,
            total_pages,
        })
    }

    pub async fn operations_page_by_author(
        &self,
        author_id: Uuid,
        page: u64,
    ) -> ResultEngine<Page<OperationView>> {
        self.operations_page(page, &OperationFilter::by_author(author_id))
            .await
    }

    pub async fn operations_page_by_wallet(
        &self,
        wallet_id: Uuid,
        page: u64,
    ) -> ResultEngine<Page<OperationView>> {
        self.operations_page(page, &OperationFilter::by_wallet(wallet_id))
            .await
    }

    pub async fn operation_by_id(
        &self,
        operation_id: Uuid,
    ) -> ResultEngine<Option<OperationView>> {
        let Some(model) = base_query()
            .apply_operation_filters(&OperationFilter::default().operation(operation_id))
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        Ok(load_views(&self.database, vec![model]).await?.pop())
    }
}

/// Point the operation at exactly the tags named in `titles`, creating the
/// missing ones.
async fn replace_tags<C: ConnectionTrait>(
    db: &C,
    operation_id: &str,
    titles: &[String],
    author_id: Uuid,
    now: DateTime<Utc>,
) -> ResultEngine<()> {
    operation_tags::Entity::delete_many()
        .filter(operation_tags::Column::OperationId.eq(operation_id))
        .exec(db)
        .await?;
    if titles.is_empty() {
        return Ok(());
    }

    let mut links = Vec::with_capacity(titles.len());
    for title in titles {
        let tag = get_or_create(db, title, author_id, now).await?;
        links.push(operation_tags::ActiveModel {
            operation_id: ActiveValue::Set(operation_id.to_string()),
            tag_id: ActiveValue::Set(tag.id),
        });
    }
    operation_tags::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Attach wallet, category, author and tags to each operation, batching
/// one query per relation.
async fn load_views<C: ConnectionTrait>(
    db: &C,
    models: Vec<operations::Model>,
) -> ResultEngine<Vec<OperationView>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let wallets = models.load_one(wallets::Entity, db).await?;
    let categories = models.load_one(categories::Entity, db).await?;
    let authors = models.load_one(users::Entity, db).await?;
    let tags = models
        .load_many_to_many(tags::Entity, operation_tags::Entity, db)
        .await?;

    let mut views = Vec::with_capacity(models.len());
    for ((((model, wallet), category), author), tags) in models
        .into_iter()
        .zip(wallets)
        .zip(categories)
        .zip(authors)
        .zip(tags)
    {
        let missing = |what: &str| EngineError::KeyNotFound(format!("{what} of {}", model.id));
        let wallet = Wallet::try_from(wallet.ok_or_else(|| missing("wallet"))?)?;
        let category = Category::try_from(category.ok_or_else(|| missing("category"))?)?;
        let author = User::try_from(author.ok_or_else(|| missing("author"))?)?;
        let mut tags = tags
            .into_iter()
            .map(Tag::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        tags.sort_by(|a, b| a.title.cmp(&b.title));

        views.push(OperationView {
            operation: Operation::try_from(model)?,
            wallet,
            category,
            author,
            tags,
        });
    }
    Ok(views)
}
