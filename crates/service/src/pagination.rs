//! Pagination utilities for service layer
//!
//! Bridges the wire-level [`PageQuery`] to sea-orm paginators.

use common::pagination::{Page, PageQuery, SortOrder};
use sea_orm::{DatabaseConnection, EntityTrait, FromQueryResult, Order, PaginatorTrait, Select};

use crate::errors::ServiceError;

pub(crate) fn to_order(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

/// Run `select` as one page of `query`, counting the full result set alongside.
pub(crate) async fn fetch_page<E, M>(
    db: &DatabaseConnection,
    select: Select<E>,
    query: &PageQuery,
) -> Result<Page<M>, ServiceError>
where
    E: EntityTrait<Model = M>,
    M: FromQueryResult + Sized + Send + Sync,
{
    query.offset()?;
    let (page_idx, per_page) = query.normalize();
    // fetch_page takes the 0-based index directly
    let paginator = select.paginate(db, per_page);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page_idx).await?;
    Ok(Page::new(rows, total, query))
}
