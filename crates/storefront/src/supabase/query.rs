//! PostgREST query construction.
//!
//! Builds the query string for `GET /rest/v1/{table}` the way the
//! supabase-js query builder does: `column=op.value` filters, `order`,
//! `limit`/`offset`, and an exact row count via `Prefer: count=exact`.

use std::fmt::Write as _;

/// Rows returned by a select, plus the total row count when requested.
#[derive(Debug, Clone)]
pub struct Selection<T> {
    pub rows: Vec<T>,
    pub total: Option<u64>,
}

/// A PostgREST select query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostgrestQuery {
    columns: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    count_exact: bool,
}

impl PostgrestQuery {
    /// Select all columns, no filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the selected columns (`select=`).
    #[must_use]
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    /// `column=eq.value`
    #[must_use]
    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "eq", &value.to_string())
    }

    /// `column=gt.value`
    #[must_use]
    pub fn gt(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "gt", &value.to_string())
    }

    /// `column=gte.value`
    #[must_use]
    pub fn gte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "gte", &value.to_string())
    }

    /// `column=lte.value`
    #[must_use]
    pub fn lte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "lte", &value.to_string())
    }

    /// Case-insensitive substring match: `column=ilike.*term*`.
    ///
    /// Characters PostgREST treats as syntax are dropped from `term`.
    #[must_use]
    pub fn ilike_contains(self, column: &str, term: &str) -> Self {
        let cleaned: String = term
            .chars()
            .filter(|c| !matches!(c, '*' | '%' | ',' | '(' | ')' | '"' | '\\'))
            .collect();
        self.filter(column, "ilike", &format!("*{}*", cleaned.trim()))
    }

    /// Append an ordering term.
    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{column}.{direction}"));
        self
    }

    /// Rows `from..=to`, zero-based and inclusive like supabase-js `range()`.
    #[must_use]
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.offset = Some(from);
        self.limit = Some(to.saturating_sub(from) + 1);
        self
    }

    /// Ask for an exact total count in `Content-Range`.
    #[must_use]
    pub const fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    /// Whether an exact count was requested.
    #[must_use]
    pub const fn wants_count(&self) -> bool {
        self.count_exact
    }

    fn filter(mut self, column: &str, op: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("{op}.{value}")));
        self
    }

    /// Render the URL query string (without leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut out = format!(
            "select={}",
            urlencoding::encode(self.columns.as_deref().unwrap_or("*"))
        );

        for (column, expression) in &self.filters {
            let _ = write!(
                out,
                "&{}={}",
                urlencoding::encode(column),
                urlencoding::encode(expression)
            );
        }

        if !self.order.is_empty() {
            let _ = write!(out, "&order={}", self.order.join(","));
        }
        if let Some(limit) = self.limit {
            let _ = write!(out, "&limit={limit}");
        }
        if let Some(offset) = self.offset {
            let _ = write!(out, "&offset={offset}");
        }

        out
    }
}

/// Total from a `Content-Range` header such as `0-11/57` or `*/0`.
#[must_use]
pub fn parse_content_range(header: &str) -> Option<u64> {
    header
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
}
