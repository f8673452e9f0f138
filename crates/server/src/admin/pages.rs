//! Admin pages: HTML documents built around [`DataTable`].
//!
//! The page owns the table state; it lives in the query string and every
//! table interaction links to the next state.

use axum::{extract::{Query, State}, response::Html, Extension};
use axum_extra::extract::WithRejection;
use dioxus::prelude::*;
use serde::Serialize;
use tracing::warn;

use common::pagination::{Page, PageQuery, SortOrder};
use service::auth::token::Claims;
use service::{schedule_service, user_service};

use super::data_table::{Align, DataTable, DataTableProps, LinkFn, TableCell, TableHeader, TableRow};
use crate::errors::JsonApiError;
use crate::routes::{auth::ServerState, schedules::OwnerFilter};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const STYLE: &str = "table { border-collapse: collapse; width: 100% } \
    th, td { padding: 6px; border-bottom: 1px solid #ddd } \
    .sort-label.active, .page-size.selected { font-weight: bold }";

/// Clicking the active column flips the order; another column sorts ascending from the first page.
pub fn sort_state(current: &PageQuery, key: &str) -> PageQuery {
    let mut next = current.clone();
    if current.order_by() == Some(key) {
        next.order = current.order.toggled();
    } else {
        next.order = SortOrder::Asc;
        next.order_by = Some(key.to_string());
        next.page = 0;
    }
    next
}

pub fn page_state(current: &PageQuery, page: u64) -> PageQuery {
    PageQuery { page, ..current.clone() }
}

/// Changing the page size returns to the first page.
pub fn rows_per_page_state(current: &PageQuery, rows_per_page: u64) -> PageQuery {
    PageQuery { page: 0, rows_per_page, ..current.clone() }
}

fn encode<T: Serialize>(value: &T) -> String {
    serde_urlencoded::to_string(value).unwrap_or_else(|e| {
        warn!(error = %e, "failed to encode admin link query");
        String::new()
    })
}

/// Link to `base` carrying the table state `q` and any extra `filter` parameters.
pub fn href<F: Serialize>(base: &str, q: &PageQuery, filter: &F) -> String {
    let (page, rows_per_page) = q.normalize();
    let state = PageQuery { page, rows_per_page, order: q.order, order_by: q.order_by().map(str::to_string) };
    let mut url = format!("{base}?{}", encode(&state));
    let extra = encode(filter);
    if !extra.is_empty() {
        url.push('&');
        url.push_str(&extra);
    }
    url
}

fn table<T, F>(
    base: &'static str,
    q: &PageQuery,
    filter: F,
    headers: Vec<TableHeader>,
    page: &Page<T>,
    rows: Vec<TableRow>,
) -> DataTableProps
where
    F: Serialize + Clone + 'static,
{
    let (pq, pf) = (q.clone(), filter.clone());
    let on_page = LinkFn::new(move |p: u64| href(base, &page_state(&pq, p), &pf));
    let (rq, rf) = (q.clone(), filter.clone());
    let on_rows_per_page = LinkFn::new(move |n: u64| href(base, &rows_per_page_state(&rq, n), &rf));
    let sq = q.clone();
    let on_sort = LinkFn::new(move |key: String| href(base, &sort_state(&sq, &key), &filter));
    DataTableProps::new(rows, on_page, on_rows_per_page)
        .headers(headers)
        .pagination(page.page, page.rows_per_page, page.total_items)
        .sort(q.order, q.order_by().map(str::to_string))
        .on_column_sort(on_sort)
}

#[derive(Props, Clone, PartialEq)]
struct AdminPageProps {
    title: String,
    table: DataTableProps,
}

#[allow(non_snake_case)]
fn AdminPage(props: AdminPageProps) -> Element {
    let t = props.table;
    rsx! {
        html {
            head {
                meta { charset: "utf-8" }
                title { "{props.title}" }
                style { "{STYLE}" }
            }
            body {
                h1 { "{props.title}" }
                DataTable {
                    rows: t.rows,
                    headers: t.headers,
                    page: t.page,
                    rows_per_page: t.rows_per_page,
                    total_items: t.total_items,
                    order: t.order,
                    order_by: t.order_by,
                    padding: t.padding,
                    loading: t.loading,
                    no_result_text: t.no_result_text,
                    page_sizes: t.page_sizes,
                    on_page_change: t.on_page_change,
                    on_rows_per_page_change: t.on_rows_per_page_change,
                    on_column_sort: t.on_column_sort,
                }
            }
        }
    }
}

fn document(title: &str, table: DataTableProps) -> Html<String> {
    let mut dom = VirtualDom::new_with_props(AdminPage, AdminPageProps { title: title.to_string(), table });
    dom.rebuild_in_place();
    Html(format!("<!DOCTYPE html>{}", dioxus_ssr::render(&dom)))
}

/// `GET /admin/users` (admin only)
pub async fn users_page(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Query(q), _): WithRejection<Query<PageQuery>, JsonApiError>,
) -> Result<Html<String>, JsonApiError> {
    let page = user_service::list_users(&state.db, claims.actor(), &q).await?;
    let headers = vec![
        TableHeader::sortable("Email", "email"),
        TableHeader::sortable("Username", "username"),
        TableHeader::sortable("Display name", "display_name"),
        TableHeader::sortable("Role", "role").align(Align::Center),
        TableHeader::sortable("Created", "created_at").align(Align::Right),
    ];
    let rows: Vec<TableRow> = page
        .rows
        .iter()
        .map(|u| vec![
            TableCell::new(&u.email),
            TableCell::new(&u.username),
            TableCell::new(&u.display_name),
            TableCell::new(&u.role).align(Align::Center),
            TableCell::new(u.created_at.format(TIME_FORMAT).to_string()).align(Align::Right),
        ])
        .collect();
    Ok(document("Users", table("/admin/users", &q, (), headers, &page, rows)))
}

/// `GET /admin/schedules`; non-admins see their own schedules.
pub async fn schedules_page(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Query(q), _): WithRejection<Query<PageQuery>, JsonApiError>,
    WithRejection(Query(filter), _): WithRejection<Query<OwnerFilter>, JsonApiError>,
) -> Result<Html<String>, JsonApiError> {
    let page = schedule_service::list_schedules(&state.db, claims.actor(), filter.owner_id, &q).await?;
    let headers = vec![
        TableHeader::sortable("Title", "title"),
        TableHeader::plain("Owner"),
        TableHeader::sortable("Starts", "starts_at"),
        TableHeader::sortable("Ends", "ends_at"),
        TableHeader::sortable("Status", "status").align(Align::Center),
        TableHeader::sortable("Created", "created_at").align(Align::Right),
    ];
    let rows: Vec<TableRow> = page
        .rows
        .iter()
        .map(|s| vec![
            match &s.description {
                Some(description) => TableCell::new(&s.title).title(description),
                None => TableCell::new(&s.title),
            },
            TableCell::new(s.owner_id.to_string()),
            TableCell::new(s.starts_at.format(TIME_FORMAT).to_string()),
            TableCell::new(s.ends_at.format(TIME_FORMAT).to_string()),
            TableCell::new(&s.status).align(Align::Center),
            TableCell::new(s.created_at.format(TIME_FORMAT).to_string()).align(Align::Right),
        ])
        .collect();
    Ok(document("Schedules", table("/admin/schedules", &q, filter, headers, &page, rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn query(order_by: Option<&str>, order: SortOrder, page: u64) -> PageQuery {
        PageQuery { page, rows_per_page: 25, order, order_by: order_by.map(str::to_string) }
    }

    #[test]
    fn clicking_active_column_flips_order_and_keeps_page() {
        let q = query(Some("email"), SortOrder::Asc, 3);
        let next = sort_state(&q, "email");
        assert_eq!(next.order, SortOrder::Desc);
        assert_eq!(next.page, 3);
        assert_eq!(sort_state(&next, "email").order, SortOrder::Asc);
    }

    #[test]
    fn clicking_other_column_sorts_ascending_from_first_page() {
        let q = query(Some("email"), SortOrder::Desc, 3);
        let next = sort_state(&q, "role");
        assert_eq!(next.order_by.as_deref(), Some("role"));
        assert_eq!(next.order, SortOrder::Asc);
        assert_eq!(next.page, 0);
    }

    #[test]
    fn changing_rows_per_page_resets_page() {
        let q = query(None, SortOrder::Asc, 4);
        let next = rows_per_page_state(&q, 50);
        assert_eq!((next.page, next.rows_per_page), (0, 50));
        assert_eq!(page_state(&q, 7).page, 7);
    }

    #[test]
    fn href_carries_state_and_filters() {
        let owner = Uuid::new_v4();
        let q = query(Some("title"), SortOrder::Desc, 2);
        let url = href("/admin/schedules", &q, &OwnerFilter { owner_id: Some(owner) });
        assert_eq!(url, format!("/admin/schedules?page=2&rowsPerPage=25&order=desc&orderBy=title&owner_id={owner}"));
        assert_eq!(
            href("/admin/users", &PageQuery::default(), &()),
            "/admin/users?page=0&rowsPerPage=10&order=asc"
        );
    }

    #[test]
    fn href_encodes_values_and_clamps_page_size() {
        let q = PageQuery { rows_per_page: 5000, order_by: Some("a b&c=d".into()), ..Default::default() };
        let url = href("/admin/users", &q, &());
        assert_eq!(url, "/admin/users?page=0&rowsPerPage=100&order=asc&orderBy=a+b%26c%3Dd");
    }

    #[test]
    fn table_links_follow_page_rules() {
        let q = query(Some("email"), SortOrder::Asc, 1);
        let page: Page<()> = Page { rows: vec![], total_items: 60, page: 1, rows_per_page: 25 };
        let headers = vec![TableHeader::sortable("Email", "email"), TableHeader::sortable("Role", "role")];
        let props = table("/admin/users", &q, (), headers, &page, vec![vec![TableCell::new("a@example.com")]]);

        let sort = props.on_column_sort.clone().expect("sort links");
        assert_eq!(sort.call("email".into()), "/admin/users?page=1&rowsPerPage=25&order=desc&orderBy=email");
        assert_eq!(sort.call("role".into()), "/admin/users?page=0&rowsPerPage=25&order=asc&orderBy=role");
        assert_eq!(props.on_rows_per_page_change.call(50), "/admin/users?page=0&rowsPerPage=50&order=asc&orderBy=email");
        assert_eq!(props.on_page_change.call(2), "/admin/users?page=2&rowsPerPage=25&order=asc&orderBy=email");
    }

    #[test]
    fn document_wraps_table_in_html_page() {
        let q = PageQuery::default();
        let page: Page<()> = Page { rows: vec![], total_items: 0, page: 0, rows_per_page: 10 };
        let props = table("/admin/users", &q, (), vec![TableHeader::sortable("Email", "email")], &page, vec![]);
        let Html(html) = document("Users & Roles", props);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Users &amp; Roles"));
        assert!(html.contains("data-table"));
        assert!(html.contains("no data"));
    }
}
