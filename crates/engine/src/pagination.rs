//! Page-number pagination over sea-orm selects.
//!
//! Pages are 1-based. Numbers below 1 are clamped to 1 and a page past the
//! end is simply empty.

use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select};
use serde::{Deserialize, Serialize};

use crate::ResultEngine;

/// Items per page for every listing unless the engine is built with
/// another size.
pub const PAGE_SIZE: u64 = 10;

/// Turns a raw `?page=` value into a page number; anything missing or
/// unparsable is page 1.
pub fn page_number(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(1)
        .max(1)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Convert the items while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }

    /// Like [`Page::map`] for conversions that can fail.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        })
    }
}

/// Fetch one page of `select` plus the total counts.
///
/// `page_size` of 0 is treated as 1. Pages past the last one are returned
/// empty without querying the items.
pub(crate) async fn fetch_page<C, E>(
    db: &C,
    select: Select<E>,
    page: u64,
    page_size: u64,
) -> ResultEngine<Page<E::Model>>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
{
    let page = page.max(1);
    let page_size = page_size.max(1);

    let paginator = select.paginate(db, page_size);
    let totals = paginator.num_items_and_pages().await?;
    // Past the end there is nothing to fetch, and the offset could overflow.
    let items = if page > totals.number_of_pages {
        Vec::new()
    } else {
        paginator.fetch_page(page - 1).await?
    };

    Ok(Page {
        items,
        page,
        page_size,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u64, total_items: u64) -> Page<u64> {
        Page {
            items: Vec::new(),
            page,
            page_size: PAGE_SIZE,
            total_items,
            total_pages: total_items.div_ceil(PAGE_SIZE),
        }
    }

    #[test]
    fn missing_or_invalid_page_is_first_page() {
        assert_eq!(page_number(None), 1);
        assert_eq!(page_number(Some("")), 1);
        assert_eq!(page_number(Some("abc")), 1);
        assert_eq!(page_number(Some("-3")), 1);
        assert_eq!(page_number(Some("0")), 1);
        assert_eq!(page_number(Some(" 4 ")), 4);
    }

    #[test]
    fn navigation_flags() {
        assert!(page(1, 15).has_next());
        assert!(!page(1, 15).has_previous());
        assert!(!page(2, 15).has_next());
        assert!(page(2, 15).has_previous());
        assert!(!page(1, 0).has_next());
    }

    #[test]
    fn map_keeps_metadata() {
        let mut source = page(2, 15);
        source.items = vec![1, 2];
        let mapped = source.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.total_pages, 2);
    }
}
