use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Category, EngineError, Page, ResultEngine, Subject, User, categories, operations,
    pagination::fetch_page,
    users,
    util::{normalize_key, normalize_title, slugify},
};

use super::{Engine, with_tx};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryInput {
    pub id: Option<Uuid>,
    pub title: String,
    /// Ignored on update; a category keeps its author.
    pub author_id: Uuid,
}

impl Engine {
    /// Create or update a category. The slug follows the title.
    pub async fn save_category(&self, input: CategoryInput) -> ResultEngine<Category> {
        let title = normalize_title(&input.title, "category")?;
        let title_norm = normalize_key(&title);
        let slug = slugify(&title);
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let mut taken = categories::Entity::find()
                .filter(categories::Column::TitleNorm.eq(title_norm.clone()));
            if let Some(id) = input.id {
                taken = taken.filter(categories::Column::Id.ne(id.to_string()));
            }
            if taken.one(&db_tx).await?.is_some() {
                return Err(EngineError::ExistingKey(title));
            }

            let model = match input.id {
                Some(id) => {
                    let existing = categories::Entity::find_by_id(id.to_string())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| {
                            EngineError::KeyNotFound("category not exists".to_string())
                        })?;
                    let mut active: categories::ActiveModel = existing.into();
                    active.title = ActiveValue::Set(title);
                    active.title_norm = ActiveValue::Set(title_norm);
                    active.slug = ActiveValue::Set(slug);
                    active.updated_at = ActiveValue::Set(now);
                    active.update(&db_tx).await?
                }
                None => {
                    users::Entity::find_by_id(input.author_id.to_string())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
                    let model = categories::ActiveModel {
                        id: ActiveValue::Set(Uuid::new_v4().to_string()),
                        title: ActiveValue::Set(title),
                        title_norm: ActiveValue::Set(title_norm),
                        slug: ActiveValue::Set(slug),
                        author_id: ActiveValue::Set(input.author_id.to_string()),
                        created_at: ActiveValue::Set(now),
                        updated_at: ActiveValue::Set(now),
                    }
                    .insert(&db_tx)
                    .await?;
                    tracing::info!(category = %model.id, slug = %model.slug, "category created");
                    model
                }
            };
            Category::try_from(model)
        })
    }

    /// `true` when no operation references the category.
    pub async fn category_can_be_deleted(&self, category_id: Uuid) -> ResultEngine<bool> {
        let used = operations::Entity::find()
            .filter(operations::Column::CategoryId.eq(category_id.to_string()))
            .count(&self.database)
            .await?;
        Ok(used == 0)
    }

    /// Delete a category. Refused with [`EngineError::InUse`] while any
    /// operation references it.
    pub async fn delete_category(&self, category_id: Uuid) -> ResultEngine<()> {
        let id = category_id.to_string();
        with_tx!(self, |db_tx| {
            let model = categories::Entity::find_by_id(id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;

            let used = operations::Entity::find()
                .filter(operations::Column::CategoryId.eq(id.clone()))
                .count(&db_tx)
                .await?;
            if used > 0 {
                return Err(EngineError::InUse(format!(
                    "category '{}' is used by {used} operations",
                    model.title
                )));
            }

            categories::Entity::delete_by_id(id.clone())
                .exec(&db_tx)
                .await?;
            tracing::info!(category = %id, "category deleted");
            Ok(())
        })
    }

    /// Categories, optionally only those of one author.
    pub async fn categories_page(
        &self,
        page: u64,
        author_id: Option<Uuid>,
    ) -> ResultEngine<Page<Category>> {
        let mut select = categories::Entity::find();
        if let Some(author_id) = author_id {
            select = select.filter(categories::Column::AuthorId.eq(author_id.to_string()));
        }
        let select = select
            .order_by_desc(categories::Column::UpdatedAt)
            .order_by_desc(categories::Column::Id);
        fetch_page(&self.database, select, page, self.page_size)
            .await?
            .try_map(Category::try_from)
    }

    pub async fn category_by_id(&self, category_id: Uuid) -> ResultEngine<Option<Category>> {
        categories::Entity::find_by_id(category_id.to_string())
            .one(&self.database)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    /// Case-insensitive lookup.
    pub async fn category_by_title(&self, title: &str) -> ResultEngine<Option<Category>> {
        categories::Entity::find()
            .filter(categories::Column::TitleNorm.eq(normalize_key(title)))
            .one(&self.database)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    /// Authorization subject for `category`, carrying its author's roles.
    pub async fn category_subject(&self, category: &Category) -> ResultEngine<Subject> {
        let author = self.require_user(category.author_id).await?;
        Ok(Subject::category(category, &author))
    }

    pub(super) async fn require_user(&self, user_id: Uuid) -> ResultEngine<User> {
        self.user_by_id(user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }
}
