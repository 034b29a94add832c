//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::firebase::FirebaseClient;
use crate::services::auth::AuthService;
use crate::services::catalog::CatalogService;
use crate::services::email_verification::EmailVerificationService;
use crate::services::verification_link::LinkSigner;
use crate::supabase::{SupabaseClient, SupabaseError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Vendor clients are built once here and
/// borrowed by the per-request services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    supabase: SupabaseClient,
    email_verification: EmailVerificationService<FirebaseClient>,
    reset_password_url: String,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Supabase client cannot be built from the
    /// configured keys.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, SupabaseError> {
        let supabase = SupabaseClient::new(&config.supabase)?;
        let email_verification = EmailVerificationService::new(
            FirebaseClient::new(&config.firebase),
            config.verify_email_url(),
            LinkSigner::new(config.link_secret.clone()),
        );
        let reset_password_url = config.reset_password_url();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                supabase,
                email_verification,
                reset_password_url,
            }),
        })
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Supabase client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    /// Get a reference to the email verification service.
    #[must_use]
    pub fn email_verification(&self) -> &EmailVerificationService<FirebaseClient> {
        &self.inner.email_verification
    }

    /// Authentication service for one request.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_, SupabaseClient, FirebaseClient> {
        AuthService::new(
            &self.inner.supabase,
            &self.inner.email_verification,
            self.inner.config.register_timeout,
            &self.inner.reset_password_url,
        )
    }

    /// Catalog service for one request.
    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_, SupabaseClient> {
        CatalogService::new(&self.inner.supabase)
    }
}
