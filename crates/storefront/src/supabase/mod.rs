//! Supabase clients: GoTrue auth, `profiles`, and the product catalog.
//!
//! # Architecture
//!
//! - Supabase is the identity store and source of truth for profile data
//! - All access goes through the REST APIs (`/auth/v1`, `/rest/v1`)
//! - User-scoped calls carry the user's access token; the profile
//!   verification sync uses the service role key
//!
//! The service layer depends on the [`IdentityBackend`] and
//! [`CatalogBackend`] traits rather than on [`SupabaseClient`] directly.

mod client;
pub mod query;
pub mod types;

pub use client::SupabaseClient;
pub use query::{PostgrestQuery, Selection};
pub use types::*;

use std::future::Future;

use serde::de::DeserializeOwned;
use thiserror::Error;

use fragranza_core::{Email, UserId};

/// Errors that can occur when interacting with Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Supabase returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// No row matched.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An admin operation was requested without a service role key.
    #[error("service role key is not configured")]
    ServiceRoleMissing,
}

impl SupabaseError {
    /// The message Supabase sent, or this error's own description.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// The access token was missing, expired, or revoked.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }

    /// Transport-level failure (DNS, connect, timeout).
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect() || e.is_timeout() || e.is_request())
    }
}

/// Identity and profile operations the auth service needs.
pub trait IdentityBackend: Send + Sync {
    /// Create an auth user; `data` becomes the user metadata.
    fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> impl Future<Output = Result<SignUpResponse, SupabaseError>> + Send;

    /// Password grant.
    fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> impl Future<Output = Result<AuthSession, SupabaseError>> + Send;

    /// Revoke the session behind `access_token`.
    fn sign_out(&self, access_token: &str)
    -> impl Future<Output = Result<(), SupabaseError>> + Send;

    /// The auth user for a live access token.
    fn get_user(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<AuthUser, SupabaseError>> + Send;

    /// The `profiles` row for `user_id`.
    fn fetch_profile(
        &self,
        access_token: &str,
        user_id: UserId,
    ) -> impl Future<Output = Result<Profile, SupabaseError>> + Send;

    /// Patch the caller's own `profiles` row.
    fn update_profile(
        &self,
        access_token: &str,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<(), SupabaseError>> + Send;

    /// Record a confirmed email address on the matching profile.
    fn mark_email_verified(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<(), SupabaseError>> + Send;

    /// Send Supabase's own password recovery email.
    fn reset_password_for_email(
        &self,
        email: &Email,
        redirect_to: &str,
    ) -> impl Future<Output = Result<(), SupabaseError>> + Send;
}

/// Read access to catalog tables.
pub trait CatalogBackend: Send + Sync {
    /// Run a PostgREST select against `table`.
    fn select<T>(
        &self,
        table: &str,
        query: &PostgrestQuery,
    ) -> impl Future<Output = Result<Selection<T>, SupabaseError>> + Send
    where
        T: DeserializeOwned + Send;
}
