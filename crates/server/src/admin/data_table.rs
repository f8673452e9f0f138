//! Stateless table component rendered to HTML with dioxus SSR.
//!
//! The table owns no state: everything it shows comes from its props, and
//! every interaction is a link produced by one of the link builders. Builders
//! receive exactly the selected value (page index, page size, column key).

use std::fmt;
use std::rc::Rc;

use dioxus::prelude::*;

use common::pagination::{SortOrder, DEFAULT_PAGE_SIZES};

pub const DEFAULT_PADDING: &str = "30px";
pub const DEFAULT_NO_RESULT_TEXT: &str = "no data";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Right => "right",
            Align::Center => "center",
            Align::Justify => "justify",
        }
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column header; only headers with a `data_key` are sortable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableHeader {
    pub label: String,
    pub data_key: Option<String>,
    pub align: Align,
}

impl TableHeader {
    pub fn plain(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Default::default() }
    }

    pub fn sortable(label: impl Into<String>, data_key: impl Into<String>) -> Self {
        Self { label: label.into(), data_key: Some(data_key.into()), ..Default::default() }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableCell {
    pub content: String,
    pub align: Align,
    /// Shown as the cell's tooltip.
    pub title: Option<String>,
}

impl TableCell {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), ..Default::default() }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

pub type TableRow = Vec<TableCell>;

/// Builds the link for a selected value. Two builders are equal when they
/// share the same closure.
pub struct LinkFn<T>(Rc<dyn Fn(T) -> String>);

impl<T> LinkFn<T> {
    pub fn new(f: impl Fn(T) -> String + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, value: T) -> String {
        (self.0)(value)
    }
}

impl<T> Clone for LinkFn<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for LinkFn<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct DataTableProps {
    pub rows: Vec<TableRow>,
    #[props(!optional)]
    pub headers: Option<Vec<TableHeader>>,
    pub page: u64,
    pub rows_per_page: u64,
    pub total_items: u64,
    pub order: SortOrder,
    #[props(!optional)]
    pub order_by: Option<String>,
    pub padding: String,
    pub loading: bool,
    /// An empty text disables the no-result message.
    pub no_result_text: String,
    pub page_sizes: Vec<u64>,
    pub on_page_change: LinkFn<u64>,
    pub on_rows_per_page_change: LinkFn<u64>,
    #[props(!optional)]
    pub on_column_sort: Option<LinkFn<String>>,
}

impl DataTableProps {
    pub fn new(rows: Vec<TableRow>, on_page_change: LinkFn<u64>, on_rows_per_page_change: LinkFn<u64>) -> Self {
        let total_items = rows.len() as u64;
        Self {
            rows,
            headers: None,
            page: 0,
            rows_per_page: DEFAULT_PAGE_SIZES[0],
            total_items,
            order: SortOrder::Asc,
            order_by: None,
            padding: DEFAULT_PADDING.to_string(),
            loading: false,
            no_result_text: DEFAULT_NO_RESULT_TEXT.to_string(),
            page_sizes: DEFAULT_PAGE_SIZES.to_vec(),
            on_page_change,
            on_rows_per_page_change,
            on_column_sort: None,
        }
    }

    pub fn headers(mut self, headers: Vec<TableHeader>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn pagination(mut self, page: u64, rows_per_page: u64, total_items: u64) -> Self {
        self.page = page;
        self.rows_per_page = rows_per_page;
        self.total_items = total_items;
        self
    }

    pub fn sort(mut self, order: SortOrder, order_by: Option<String>) -> Self {
        self.order = order;
        self.order_by = order_by;
        self
    }

    pub fn padding(mut self, padding: impl Into<String>) -> Self {
        self.padding = padding.into();
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn no_result_text(mut self, text: impl Into<String>) -> Self {
        self.no_result_text = text.into();
        self
    }

    pub fn page_sizes(mut self, sizes: Vec<u64>) -> Self {
        self.page_sizes = sizes;
        self
    }

    pub fn on_column_sort(mut self, f: LinkFn<String>) -> Self {
        self.on_column_sort = Some(f);
        self
    }

    /// Render the table on its own, without a surrounding document.
    pub fn render(self) -> String {
        let mut dom = VirtualDom::new_with_props(DataTable, self);
        dom.rebuild_in_place();
        dioxus_ssr::render(&dom)
    }
}

struct HeaderView {
    label: String,
    align: Align,
    sort: Option<SortLabel>,
}

struct SortLabel {
    key: String,
    class: &'static str,
    direction: &'static str,
    href: Option<String>,
}

struct PageLink {
    size: u64,
    class: &'static str,
    href: String,
}

fn header_views(props: &DataTableProps) -> Vec<HeaderView> {
    let headers = props.headers.as_deref().unwrap_or_default();
    headers
        .iter()
        .map(|h| HeaderView {
            label: h.label.clone(),
            align: h.align,
            sort: h.data_key.as_ref().map(|key| {
                let active = props.order_by.as_deref() == Some(key.as_str());
                SortLabel {
                    key: key.clone(),
                    class: if active { "sort-label active" } else { "sort-label" },
                    direction: if active { props.order.as_str() } else { "" },
                    href: props.on_column_sort.as_ref().map(|f| f.call(key.clone())),
                }
            }),
        })
        .collect()
}

/// `(from, to)` of the displayed rows; saturates for pages far past the end.
fn displayed_range(page: u64, per_page: u64, total_items: u64) -> (u64, u64) {
    if total_items == 0 {
        return (0, 0);
    }
    let from = page.saturating_mul(per_page).saturating_add(1);
    let to = page.saturating_add(1).saturating_mul(per_page).min(total_items);
    (from, to)
}

#[allow(non_snake_case)]
pub fn DataTable(props: DataTableProps) -> Element {
    let show_headers = props.headers.is_some();
    let headers = header_views(&props);
    let show_body = !props.loading && !props.rows.is_empty();
    let show_no_result = props.rows.is_empty() && !props.no_result_text.is_empty() && !props.loading;

    let per_page = props.rows_per_page.max(1);
    let (from, to) = displayed_range(props.page, per_page, props.total_items);
    let total = props.total_items;
    let last_page = total.saturating_sub(1) / per_page;
    let prev_href = (props.page > 0).then(|| props.on_page_change.call(props.page - 1));
    let next_href = (props.page < last_page).then(|| props.on_page_change.call(props.page + 1));
    let page_links: Vec<PageLink> = props
        .page_sizes
        .iter()
        .map(|&size| PageLink {
            size,
            class: if size == props.rows_per_page { "page-size selected" } else { "page-size" },
            href: props.on_rows_per_page_change.call(size),
        })
        .collect();

    rsx! {
        div {
            class: "data-table",
            style: "padding: {props.padding}",
            table {
                if show_headers {
                    thead {
                        tr {
                            for (i, h) in headers.into_iter().enumerate() {
                                th {
                                    key: "{i}",
                                    style: "text-align: {h.align}",
                                    {
                                        match h.sort {
                                            Some(s) => rsx! {
                                                a {
                                                    class: s.class,
                                                    "data-key": s.key,
                                                    "data-direction": s.direction,
                                                    href: s.href,
                                                    "{h.label}"
                                                }
                                            },
                                            None => rsx! { "{h.label}" },
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                if show_body {
                    tbody {
                        for (i, row) in props.rows.iter().enumerate() {
                            tr {
                                key: "{i}",
                                for (j, cell) in row.iter().enumerate() {
                                    td {
                                        key: "{j}",
                                        style: "text-align: {cell.align}",
                                        title: cell.title.clone(),
                                        "{cell.content}"
                                    }
                                }
                            }
                        }
                    }
                }
            }
            if show_no_result {
                p { class: "no-result", "{props.no_result_text}" }
            } else if props.loading {
                div { class: "spinner", "role": "progressbar" }
            }
            nav {
                class: "pagination",
                span {
                    class: "rows-per-page",
                    "Rows per page:"
                    for link in page_links {
                        a { key: "{link.size}", class: link.class, href: link.href, "{link.size}" }
                    }
                }
                span { class: "displayed-rows", "{from}-{to} of {total}" }
                {prev_href.map(|href| rsx! { a { class: "page-prev", href, "‹" } })}
                {next_href.map(|href| rsx! { a { class: "page-next", href, "›" } })}
            }
        }
    }
}
