//! Supabase wire types.
//!
//! These mirror GoTrue and PostgREST JSON. Domain types built from them live
//! in `crate::models`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fragranza_core::{CategoryId, CurrencyCode, Email, Price, ProductId, Role, UserId};

// =============================================================================
// Auth
// =============================================================================

/// Metadata submitted at sign-up; stored as GoTrue `user_metadata` and read
/// by the database trigger that creates the `profiles` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignUpMetadata {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
}

/// Body of `POST /auth/v1/signup`.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: Email,
    pub password: String,
    pub data: SignUpMetadata,
}

/// What sign-up produced: a session when email confirmation is off,
/// otherwise only the unconfirmed user.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

impl SignUpResponse {
    /// The created user.
    #[must_use]
    pub const fn user(&self) -> &AuthUser {
        match self {
            Self::Session(session) => &session.user,
            Self::User(user) => user,
        }
    }

    /// The session, if Supabase signed the user in immediately.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::Session(session) => Some(session),
            Self::User(_) => None,
        }
    }
}

/// Token response of the password grant.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

/// A GoTrue user.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    /// A string field from `user_metadata`.
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .get(key)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Role from metadata, defaulting to customer when absent or unknown.
    #[must_use]
    pub fn metadata_role(&self) -> Role {
        self.metadata_str("role")
            .and_then(|r| r.parse().ok())
            .unwrap_or_default()
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// A `profiles` row.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The profile fields a user may change themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    /// Nothing to write.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.phone.is_none()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A `products` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ProductRow {
    /// Price with currency.
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::new(self.price, self.currency)
    }
}

/// A `categories` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

const fn default_true() -> bool {
    true
}
