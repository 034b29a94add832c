//! Catalog API handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use fragranza_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::{Category, Product};
use crate::services::catalog::{Page, ProductFilter};
use crate::state::AppState;

/// `GET /api/products`
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Page<Product>>> {
    Ok(Json(state.catalog().list_products(&filter).await?))
}

/// `GET /api/products/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// `GET /api/categories`
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog().list_categories().await?))
}
