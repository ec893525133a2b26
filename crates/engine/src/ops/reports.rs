use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, OperationFilter, OperationView, Page, Report, ResultEngine, categories,
    pagination::fetch_page, reports, tags, users, util::normalize_title, wallets,
};

use super::{Engine, with_tx};

/// Saved criteria of a report. Every `None` criterion matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportInput {
    pub id: Option<Uuid>,
    pub title: String,
    pub category_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    pub wallet_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Ignored on update.
    pub author_id: Uuid,
}

impl Engine {
    pub async fn save_report(&self, input: ReportInput) -> ResultEngine<Report> {
        let title = normalize_title(&input.title, "report")?;
        OperationFilter {
            date_from: input.date_from,
            date_to: input.date_to,
            ..OperationFilter::default()
        }
        .validate()?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            ensure_exists::<categories::Entity, _>(&db_tx, input.category_id, "category").await?;
            ensure_exists::<tags::Entity, _>(&db_tx, input.tag_id, "tag").await?;
            ensure_exists::<wallets::Entity, _>(&db_tx, input.wallet_id, "wallet").await?;

            let category_id = ActiveValue::Set(input.category_id.map(|id| id.to_string()));
            let tag_id = ActiveValue::Set(input.tag_id.map(|id| id.to_string()));
            let wallet_id = ActiveValue::Set(input.wallet_id.map(|id| id.to_string()));

            let model = match input.id {
                Some(id) => {
                    let existing = reports::Entity::find_by_id(id.to_string())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| EngineError::KeyNotFound("report not exists".to_string()))?;
                    let mut active: reports::ActiveModel = existing.into();
                    active.title = ActiveValue::Set(title);
                    active.category_id = category_id;
                    active.tag_id = tag_id;
                    active.wallet_id = wallet_id;
                    active.date_from = ActiveValue::Set(input.date_from);
                    active.date_to = ActiveValue::Set(input.date_to);
                    active.updated_at = ActiveValue::Set(now);
                    active.update(&db_tx).await?
                }
                None => {
                    ensure_exists::<users::Entity, _>(&db_tx, Some(input.author_id), "user")
                        .await?;
                    let model = reports::ActiveModel {
                        id: ActiveValue::Set(Uuid::new_v4().to_string()),
                        title: ActiveValue::Set(title),
                        category_id,
                        tag_id,
                        wallet_id,
                        date_from: ActiveValue::Set(input.date_from),
                        date_to: ActiveValue::Set(input.date_to),
                        author_id: ActiveValue::Set(input.author_id.to_string()),
                        created_at: ActiveValue::Set(now),
                        updated_at: ActiveValue::Set(now),
                    }
                    .insert(&db_tx)
                    .await?;
                    tracing::info!(report = %model.id, author = %model.author_id, "report created");
                    model
                }
            };
            Report::try_from(model)
        })
    }

    pub async fn delete_report(&self, report_id: Uuid) -> ResultEngine<()> {
        let id = report_id.to_string();
        with_tx!(self, |db_tx| {
            let result = reports::Entity::delete_by_id(id.clone())
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("report not exists".to_string()));
            }
            tracing::info!(report = %id, "report deleted");
            Ok(())
        })
    }

    /// Reports of `author_id` by title, last first.
    pub async fn reports_page(&self, page: u64, author_id: Uuid) -> ResultEngine<Page<Report>> {
        let select = reports::Entity::find()
            .filter(reports::Column::AuthorId.eq(author_id.to_string()))
            .order_by_desc(reports::Column::Title)
            .order_by_desc(reports::Column::Id);
        fetch_page(&self.database, select, page, self.page_size)
            .await?
            .try_map(Report::try_from)
    }

    pub async fn report_by_id(&self, report_id: Uuid) -> ResultEngine<Option<Report>> {
        reports::Entity::find_by_id(report_id.to_string())
            .one(&self.database)
            .await?
            .map(Report::try_from)
            .transpose()
    }

    /// Operations matching the saved criteria of `report`.
    pub async fn report_operations_page(
        &self,
        report: &Report,
        page: u64,
    ) -> ResultEngine<Page<OperationView>> {
        self.operations_page(page, &report.filter()).await
    }
}

async fn ensure_exists<E, C>(db: &C, id: Option<Uuid>, label: &str) -> ResultEngine<()>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<String>,
    C: ConnectionTrait,
{
    let Some(id) = id else {
        return Ok(());
    };
    E::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("{label} not exists")))?;
    Ok(())
}
