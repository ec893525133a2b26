use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, Page, ResultEngine, Subject, Tag, operation_tags,
    pagination::fetch_page,
    tags, users,
    util::{normalize_key, normalize_title},
};

use super::{Engine, with_tx};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagInput {
    pub id: Option<Uuid>,
    pub title: String,
    /// Ignored on update.
    pub author_id: Uuid,
}

impl Engine {
    pub async fn save_tag(&self, input: TagInput) -> ResultEngine<Tag> {
        let title = normalize_title(&input.title, "tag")?;
        let title_norm = normalize_key(&title);
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let mut taken =
                tags::Entity::find().filter(tags::Column::TitleNorm.eq(title_norm.clone()));
            if let Some(id) = input.id {
                taken = taken.filter(tags::Column::Id.ne(id.to_string()));
            }
            if taken.one(&db_tx).await?.is_some() {
                return Err(EngineError::ExistingKey(title));
            }

            let model = match input.id {
                Some(id) => {
                    let existing = tags::Entity::find_by_id(id.to_string())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| EngineError::KeyNotFound("tag not exists".to_string()))?;
                    let mut active: tags::ActiveModel = existing.into();
                    active.title = ActiveValue::Set(title);
                    active.title_norm = ActiveValue::Set(title_norm);
                    active.updated_at = ActiveValue::Set(now);
                    active.update(&db_tx).await?
                }
                None => insert_tag(&db_tx, title, title_norm, input.author_id, now).await?,
            };
            Tag::try_from(model)
        })
    }

    /// Return the tag whose title matches `title` case-insensitively, creating
    /// it for `author_id` when none exists.
    pub async fn get_or_create_tag(&self, title: &str, author_id: Uuid) -> ResultEngine<Tag> {
        let title = normalize_title(title, "tag")?;
        with_tx!(self, |db_tx| {
            let model = get_or_create(&db_tx, &title, author_id, Utc::now()).await?;
            Tag::try_from(model)
        })
    }

    /// Delete a tag and unlink it from every operation.
    pub async fn delete_tag(&self, tag_id: Uuid) -> ResultEngine<()> {
        let id = tag_id.to_string();
        with_tx!(self, |db_tx| {
            tags::Entity::find_by_id(id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("tag not exists".to_string()))?;

            let unlinked = operation_tags::Entity::delete_many()
                .filter(operation_tags::Column::TagId.eq(id.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;
            tags::Entity::delete_by_id(id.clone()).exec(&db_tx).await?;
            tracing::info!(tag = %id, unlinked, "tag deleted");
            Ok(())
        })
    }

    /// Tags by title, last first; optionally only one author's.
    pub async fn tags_page(&self, page: u64, author_id: Option<Uuid>) -> ResultEngine<Page<Tag>> {
        let mut select = tags::Entity::find();
        if let Some(author_id) = author_id {
            select = select.filter(tags::Column::AuthorId.eq(author_id.to_string()));
        }
        let select = select
            .order_by_desc(tags::Column::Title)
            .order_by_desc(tags::Column::Id);
        fetch_page(&self.database, select, page, self.page_size)
            .await?
            .try_map(Tag::try_from)
    }

    pub async fn tag_by_id(&self, tag_id: Uuid) -> ResultEngine<Option<Tag>> {
        tags::Entity::find_by_id(tag_id.to_string())
            .one(&self.database)
            .await?
            .map(Tag::try_from)
            .transpose()
    }

    /// Case-insensitive lookup.
    pub async fn tag_by_title(&self, title: &str) -> ResultEngine<Option<Tag>> {
        tags::Entity::find()
            .filter(tags::Column::TitleNorm.eq(normalize_key(title)))
            .one(&self.database)
            .await?
            .map(Tag::try_from)
            .transpose()
    }

    /// Authorization subject for `tag`, carrying its author's roles.
    pub async fn tag_subject(&self, tag: &Tag) -> ResultEngine<Subject> {
        let author = self.require_user(tag.author_id).await?;
        Ok(Subject::tag(tag, &author))
    }
}

/// Lookup by normalized title, insert on miss. `title` must already be
/// normalized with `normalize_title`.
pub(super) async fn get_or_create<C: ConnectionTrait>(
    db: &C,
    title: &str,
    author_id: Uuid,
    now: DateTime<Utc>,
) -> ResultEngine<tags::Model> {
    let title_norm = normalize_key(title);
    if let Some(existing) = tags::Entity::find()
        .filter(tags::Column::TitleNorm.eq(title_norm.clone()))
        .one(db)
        .await?
    {
        return Ok(existing);
    }
    insert_tag(db, title.to_string(), title_norm, author_id, now).await
}

async fn insert_tag<C: ConnectionTrait>(
    db: &C,
    title: String,
    title_norm: String,
    author_id: Uuid,
    now: DateTime<Utc>,
) -> ResultEngine<tags::Model> {
    users::Entity::find_by_id(author_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;

    let model = tags::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        title: ActiveValue::Set(title),
        title_norm: ActiveValue::Set(title_norm),
        author_id: ActiveValue::Set(author_id.to_string()),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
    }
    .insert(db)
    .await?;
    tracing::debug!(tag = %model.id, title = %model.title, "tag created");
    Ok(model)
}
