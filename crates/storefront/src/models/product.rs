//! Catalog domain types.

use serde::Serialize;

use fragranza_core::{CategoryId, Price, ProductId};

use crate::supabase::{CategoryRow, ProductRow};

/// A product as shown in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    /// Formatted price, e.g. `€24.90`.
    pub price_display: String,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
    pub in_stock: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let price = row.price();
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price_display: price.display(),
            price,
            category_id: row.category_id,
            image_url: row.image_url,
            stock_quantity: row.stock_quantity,
            in_stock: row.stock_quantity > 0,
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
        }
    }
}
