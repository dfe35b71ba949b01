//! Client-side filtering and pagination for resource tables.
//!
//! Tables load the full list once and then filter and page locally. A query
//! can carry a free search matched against any text column, per-column
//! searches that must all match, and an exact status filter. Pages are
//! fixed-size and 1-based.

use thiserror::Error;

use crate::models::{Branch, Category, Order, Product, StoreInfo, User};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ListingError {
    #[error("Unknown column '{column}', expected one of: {}", available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<&'static str>,
    },
}

/// A text column that can be searched on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchColumn {
    pub name: &'static str,
    /// Matched as typed instead of lowercased (phone numbers).
    pub case_sensitive: bool,
}

impl SearchColumn {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            case_sensitive: false,
        }
    }

    const fn exact_case(name: &'static str) -> Self {
        Self {
            name,
            case_sensitive: true,
        }
    }
}

/// A record that can appear in a filtered table.
pub trait Listable {
    /// Columns accepted by per-column searches.
    fn search_columns() -> &'static [SearchColumn]
    where
        Self: Sized;

    /// Text of the named column, `None` for a name outside `search_columns`.
    fn column(&self, name: &str) -> Option<&str>;

    /// Value compared against the status filter.
    fn status_key(&self) -> String;

    /// Text columns the free search matches against.
    fn search_fields(&self) -> Vec<&str>
    where
        Self: Sized,
    {
        Self::search_columns()
            .iter()
            .filter_map(|col| self.column(col.name))
            .collect()
    }
}

/// Substring search on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSearch {
    pub column: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    /// Every entry must match.
    pub columns: Vec<ColumnSearch>,
    pub status: Option<String>,
    /// 1-based page number; 0 is treated as 1.
    pub page: usize,
}

impl ListQuery {
    /// Reject column searches naming a column `T` does not have.
    pub fn validate<T: Listable>(&self) -> Result<(), ListingError> {
        let known = T::search_columns();
        for search in &self.columns {
            if !known.iter().any(|col| col.name == search.column) {
                return Err(ListingError::UnknownColumn {
                    column: search.column.clone(),
                    available: known.iter().map(|col| col.name).collect(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

fn column_matches<T: Listable>(item: &T, search: &ColumnSearch) -> bool {
    let Some(column) = T::search_columns().iter().find(|col| col.name == search.column) else {
        return false;
    };
    let value = item.column(column.name).unwrap_or_default();
    if column.case_sensitive {
        value.contains(search.text.as_str())
    } else {
        value.to_lowercase().contains(&search.text.to_lowercase())
    }
}

fn matches<T: Listable>(item: &T, query: &ListQuery) -> bool {
    let search_ok = match query.search.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(needle) => {
            let needle = needle.to_lowercase();
            item.search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        }
    };

    let columns_ok = query.columns.iter().all(|search| column_matches(item, search));

    let status_ok = match query.status.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(status) => item.status_key().eq_ignore_ascii_case(status),
    };

    search_ok && columns_ok && status_ok
}

/// Items matching the query, in their original order.
pub fn filter<'a, T: Listable>(items: &'a [T], query: &ListQuery) -> Vec<&'a T> {
    items.iter().filter(|item| matches(*item, query)).collect()
}

/// Slice `items` into page `page` of `per_page` rows.
/// A page past the end is empty but still reports the real totals.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        total_pages,
        total_items,
    }
}

/// Filter then paginate in one step.
pub fn filter_and_page<'a, T: Listable>(items: &'a [T], query: &ListQuery, per_page: usize) -> Page<&'a T> {
    paginate(filter(items, query), query.page, per_page)
}

impl Listable for User {
    fn search_columns() -> &'static [SearchColumn] {
        const COLUMNS: &[SearchColumn] = &[
            SearchColumn::new("name"),
            SearchColumn::new("username"),
            SearchColumn::new("email"),
        ];
        COLUMNS
    }

    fn column(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(self.full_name.as_str()),
            "username" => Some(self.username.as_str()),
            "email" => Some(self.email.as_str()),
            _ => None,
        }
    }

    fn status_key(&self) -> String {
        self.status.to_string()
    }
}

impl Listable for StoreInfo {
    fn search_columns() -> &'static [SearchColumn] {
        const COLUMNS: &[SearchColumn] = &[SearchColumn::new("name"), SearchColumn::new("code")];
        COLUMNS
    }

    fn column(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(self.name.as_str()),
            "code" => Some(self.code.as_str()),
            _ => None,
        }
    }

    fn status_key(&self) -> String {
        self.status.to_string()
    }
}

impl Listable for Branch {
    fn search_columns() -> &'static [SearchColumn] {
        const COLUMNS: &[SearchColumn] = &[SearchColumn::new("name"), SearchColumn::new("country")];
        COLUMNS
    }

    fn column(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(self.name.as_str()),
            "country" => Some(self.country.as_str()),
            _ => None,
        }
    }

    fn status_key(&self) -> String {
        self.status.to_string()
    }
}

impl Listable for Category {
    fn search_columns() -> &'static [SearchColumn] {
        const COLUMNS: &[SearchColumn] = &[SearchColumn::new("name")];
        COLUMNS
    }

    fn column(&self, name: &str) -> Option<&str> {
        (name == "name").then_some(self.name.as_str())
    }

    fn status_key(&self) -> String {
        self.status.to_string()
    }
}

impl Listable for Product {
    fn search_columns() -> &'static [SearchColumn] {
        const COLUMNS: &[SearchColumn] = &[SearchColumn::new("name")];
        COLUMNS
    }

    fn column(&self, name: &str) -> Option<&str> {
        (name == "name").then_some(self.name.as_str())
    }

    /// Products filter on their `active` flag ("true" / "false").
    fn status_key(&self) -> String {
        self.active.to_string()
    }
}

impl Listable for Order {
    fn search_columns() -> &'static [SearchColumn] {
        const COLUMNS: &[SearchColumn] = &[SearchColumn::new("name"), SearchColumn::exact_case("phone")];
        COLUMNS
    }

    fn column(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(self.customer_name.as_str()),
            "phone" => Some(self.phone.as_str()),
            _ => None,
        }
    }

    fn status_key(&self) -> String {
        self.status.as_str().to_string()
    }
}
