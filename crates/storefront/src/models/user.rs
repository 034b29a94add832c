//! User domain types.
//!
//! These types represent validated domain objects separate from the
//! Supabase wire types in `crate::supabase`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fragranza_core::{Email, Role, UserId};

use crate::supabase::{AuthUser, Profile};

/// A confirmed storefront user.
///
/// Built from the live Supabase session (auth user + `profiles` row), never
/// from what the client submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Profile verification flag.
    pub is_verified: bool,
    /// Whether the email address is confirmed.
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build from a `profiles` row.
    #[must_use]
    pub fn from_profile(profile: Profile, email: Email, email_verified: bool) -> Self {
        Self {
            id: profile.id,
            email,
            first_name: profile.first_name.unwrap_or_default(),
            last_name: profile.last_name.unwrap_or_default(),
            phone: profile.phone,
            role: profile.role,
            is_verified: profile.is_verified,
            email_verified,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }

    /// Build from auth metadata alone, for when the profile row is missing
    /// or unreadable. Such a user is never verified at the profile level.
    #[must_use]
    pub fn from_auth_metadata(auth: &AuthUser, email: Email, email_verified: bool) -> Self {
        Self {
            id: auth.id,
            email,
            first_name: auth.metadata_str("first_name").unwrap_or_default().to_string(),
            last_name: auth.metadata_str("last_name").unwrap_or_default().to_string(),
            phone: auth.metadata_str("phone").map(str::to_string),
            role: auth.metadata_role(),
            is_verified: false,
            email_verified,
            created_at: auth.created_at,
            updated_at: auth.updated_at.unwrap_or(auth.created_at),
        }
    }

    /// Display name, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.to_string()
        } else {
            name.to_string()
        }
    }
}

/// A freshly registered user the backend has not confirmed yet.
///
/// Echoes what was submitted at sign-up. Carries no verification flags so it
/// cannot be mistaken for a confirmed [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUser {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub submitted_at: DateTime<Utc>,
}

/// The user snapshot kept in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CachedUser {
    Pending(PendingUser),
    Confirmed(User),
}

impl CachedUser {
    /// User ID regardless of state.
    #[must_use]
    pub const fn id(&self) -> UserId {
        match self {
            Self::Pending(user) => user.id,
            Self::Confirmed(user) => user.id,
        }
    }

    /// Email regardless of state.
    #[must_use]
    pub const fn email(&self) -> &Email {
        match self {
            Self::Pending(user) => &user.email,
            Self::Confirmed(user) => &user.email,
        }
    }

    /// The confirmed user, if the backend has confirmed one.
    #[must_use]
    pub const fn confirmed(&self) -> Option<&User> {
        match self {
            Self::Confirmed(user) => Some(user),
            Self::Pending(_) => None,
        }
    }
}
