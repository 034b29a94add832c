//! Product catalog reads.
//!
//! Queries the `products` and `categories` tables through PostgREST. Only
//! active products are ever listed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fragranza_core::ProductId;

use crate::models::{Category, Product};
use crate::supabase::{CatalogBackend, CategoryRow, PostgrestQuery, ProductRow, SupabaseError};

/// Default page size.
pub const DEFAULT_PER_PAGE: u32 = 12;

/// Largest page size a client may ask for.
pub const MAX_PER_PAGE: u32 = 100;

const PRODUCTS: &str = "products";
const CATEGORIES: &str = "categories";

/// Product ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    const fn order(self) -> (&'static str, bool) {
        match self {
            Self::Newest => ("created_at", false),
            Self::PriceAsc => ("price", true),
            Self::PriceDesc => ("price", false),
            Self::Name => ("name", true),
        }
    }
}

/// Product listing filters, as sent in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub sort: ProductSort,
    /// 1-based.
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductFilter {
    /// Requested page, at least 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            items,
            page,
            per_page,
            total,
            total_pages: total.div_ceil(u64::from(per_page)),
        }
    }
}

/// Catalog service.
pub struct CatalogService<'a, B> {
    backend: &'a B,
}

impl<'a, B: CatalogBackend> CatalogService<'a, B> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// List active products matching `filter`.
    ///
    /// An unknown category slug yields an empty page.
    ///
    /// # Errors
    ///
    /// Returns an error if Supabase cannot be queried.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>, SupabaseError> {
        let page = filter.page();
        let per_page = filter.per_page();

        let mut query = PostgrestQuery::new().eq("is_active", true);

        if let Some(slug) = filter.category.as_deref().filter(|s| !s.is_empty()) {
            let Some(category) = self.category_by_slug(slug).await? else {
                tracing::debug!(slug, "Unknown category slug");
                return Ok(Page::new(Vec::new(), page, per_page, 0));
            };
            query = query.eq("category_id", category.id);
        }
        if let Some(term) = filter.search_term() {
            query = query.ilike_contains("name", term);
        }
        if let Some(min) = filter.min_price {
            query = query.gte("price", min);
        }
        if let Some(max) = filter.max_price {
            query = query.lte("price", max);
        }
        if filter.in_stock {
            query = query.gt("stock_quantity", 0);
        }

        let (column, ascending) = filter.sort.order();
        let from = u64::from(page - 1) * u64::from(per_page);
        let query = query
            .order(column, ascending)
            .range(from, from + u64::from(per_page) - 1)
            .count_exact();

        let selection = self.backend.select::<ProductRow>(PRODUCTS, &query).await?;
        let total = selection.total.unwrap_or(selection.rows.len() as u64);
        let items = selection.rows.into_iter().map(Product::from).collect();

        Ok(Page::new(items, page, per_page, total))
    }

    /// A single active product.
    ///
    /// # Errors
    ///
    /// Returns an error if Supabase cannot be queried.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, SupabaseError> {
        let query = PostgrestQuery::new()
            .eq("id", id)
            .eq("is_active", true)
            .range(0, 0);

        let selection = self.backend.select::<ProductRow>(PRODUCTS, &query).await?;
        Ok(selection.rows.into_iter().next().map(Product::from))
    }

    /// All categories by name.
    ///
    /// # Errors
    ///
    /// Returns an error if Supabase cannot be queried.
    pub async fn list_categories(&self) -> Result<Vec<Category>, SupabaseError> {
        let query = PostgrestQuery::new().order("name", true);
        let selection = self.backend.select::<CategoryRow>(CATEGORIES, &query).await?;
        Ok(selection.rows.into_iter().map(Category::from).collect())
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<CategoryRow>, SupabaseError> {
        let query = PostgrestQuery::new().eq("slug", slug).range(0, 0);
        let selection = self.backend.select::<CategoryRow>(CATEGORIES, &query).await?;
        Ok(selection.rows.into_iter().next())
    }
}
