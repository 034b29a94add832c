//! HTTP route handlers for storefront.
//!
//! All endpoints speak JSON. Auth endpoints answer with the
//! `{success, message, data?}` envelope whatever the outcome.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                   - Liveness
//! GET   /health/ready             - Readiness (database)
//!
//! # Auth
//! POST  /auth/register            - Sign up and send the verification email
//! POST  /auth/login               - Sign in
//! POST  /auth/logout              - Sign out
//! GET   /auth/me                  - Refresh and return the current user
//! PATCH /auth/profile             - Update names and phone (requires auth)
//! POST  /auth/forgot-password     - Password recovery email
//!
//! # Email verification
//! GET   /auth/verify-email        - Landing page for verification links
//! POST  /auth/verify-email/resend - Resend the verification email
//!
//! # Catalog
//! GET   /api/products             - Filtered, paginated product list
//! GET   /api/products/{id}        - Product detail
//! GET   /api/categories           - Category list
//! ```

pub mod auth;
pub mod catalog;
pub mod verify_email;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::Serialize;

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::services::ServiceResponse;
use crate::state::AppState;

/// Render an envelope: 200 on success, `failure_status` otherwise.
pub fn envelope<T: Serialize>(response: ServiceResponse<T>, failure_status: StatusCode) -> Response {
    let status = if response.success {
        StatusCode::OK
    } else {
        failure_status
    };
    (status, Json(response)).into_response()
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/verify-email", get(verify_email::verify))
        .route("/verify-email/resend", post(verify_email::resend))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/profile", patch(auth::update_profile))
        .merge(limited)
}

/// Create the catalog API router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::list_products))
        .route("/products/{id}", get(catalog::get_product))
        .route("/categories", get(catalog::list_categories))
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/api", catalog_routes())
}
