//! Business logic services for storefront.
//!
//! # Services
//!
//! - `email_verification` - Firebase-backed verification and reset emails
//! - `verification_flow` - Interprets verification links from those emails
//! - `verification_link` - Signs the email carried on those links
//! - `auth` - Supabase sign-up/sign-in, profiles, and the session user cache
//! - `catalog` - Filtered, paginated product reads
//!
//! Every user-facing operation resolves to a [`ServiceResponse`]; vendor
//! failures become a message for the caller to render, never a panic or an
//! HTTP error.

pub mod auth;
pub mod catalog;
pub mod email_verification;
pub mod verification_flow;
pub mod verification_link;

use serde::Serialize;

/// Uniform `{success, message, data?}` result envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceResponse<T = ()> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    /// Success carrying data.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Success without data.
    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// Failure with a user-facing message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}
