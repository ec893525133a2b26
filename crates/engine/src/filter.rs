//! Operation listing queries.
//!
//! Every listing starts from [`base_query`] and narrows it with an
//! [`OperationFilter`]. Each criterion that is set contributes exactly one
//! predicate; criteria that are not set contribute nothing.

use chrono::{DateTime, Utc};
use sea_orm::{
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, prelude::*,
    sea_query::Query,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, operation_tags, operations};

/// Criteria for listing operations. Unset fields are not applied.
///
/// `date_from` and `date_to` are both inclusive bounds on the creation time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationFilter {
    pub category: Option<Uuid>,
    pub tag: Option<Uuid>,
    pub operation: Option<Uuid>,
    pub author: Option<Uuid>,
    pub wallet: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl OperationFilter {
    pub fn by_author(author: Uuid) -> Self {
        Self::default().author(author)
    }

    pub fn by_wallet(wallet: Uuid) -> Self {
        Self::default().wallet(wallet)
    }

    pub fn category(mut self, id: Uuid) -> Self {
        self.category = Some(id);
        self
    }

    pub fn tag(mut self, id: Uuid) -> Self {
        self.tag = Some(id);
        self
    }

    pub fn operation(mut self, id: Uuid) -> Self {
        self.operation = Some(id);
        self
    }

    pub fn author(mut self, id: Uuid) -> Self {
        self.author = Some(id);
        self
    }

    pub fn wallet(mut self, id: Uuid) -> Self {
        self.wallet = Some(id);
        self
    }

    pub fn date_from(mut self, from: DateTime<Utc>) -> Self {
        self.date_from = Some(from);
        self
    }

    pub fn date_to(mut self, to: DateTime<Utc>) -> Self {
        self.date_to = Some(to);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to)
            && from > to
        {
            return Err(EngineError::InvalidFilter(
                "date_from must not be after date_to".to_string(),
            ));
        }
        Ok(())
    }
}

/// All operations joined with their wallet, category and author, newest
/// update first. The trailing id order keeps ties stable.
pub(crate) fn base_query() -> Select<operations::Entity> {
    operations::Entity::find()
        .join(JoinType::InnerJoin, operations::Relation::Wallet.def())
        .join(JoinType::InnerJoin, operations::Relation::Category.def())
        .join(JoinType::InnerJoin, operations::Relation::Author.def())
        .order_by_desc(operations::Column::UpdatedAt)
        .order_by_desc(operations::Column::Id)
}

pub(crate) trait ApplyOperationFilters: QueryFilter + Sized {
    fn apply_operation_filters(self, filter: &OperationFilter) -> Self;
}

impl<T> ApplyOperationFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_operation_filters(mut self, filter: &OperationFilter) -> Self {
        if let Some(category) = filter.category {
            self = self.filter(operations::Column::CategoryId.eq(category.to_string()));
        }
        if let Some(tag) = filter.tag {
            self = self.filter(
                operations::Column::Id.in_subquery(
                    Query::select()
                        .column(operation_tags::Column::OperationId)
                        .from(operation_tags::Entity)
                        .and_where(operation_tags::Column::TagId.eq(tag.to_string()))
                        .to_owned(),
                ),
            );
        }
        if let Some(operation) = filter.operation {
            self = self.filter(operations::Column::Id.eq(operation.to_string()));
        }
        if let Some(author) = filter.author {
            self = self.filter(operations::Column::AuthorId.eq(author.to_string()));
        }
        if let Some(wallet) = filter.wallet {
            self = self.filter(operations::Column::WalletId.eq(wallet.to_string()));
        }
        if let Some(from) = filter.date_from {
            self = self.filter(operations::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.date_to {
            self = self.filter(operations::Column::CreatedAt.lte(to));
        }
        self
    }
}
