//! Session-related types.
//!
//! The stored session is two entries: the cached user snapshot and the
//! Supabase access token. They are written and cleared together.

use secrecy::SecretString;

use super::user::CachedUser;

/// Session keys for authentication data.
pub mod keys {
    /// Key for the cached [`CachedUser`](super::CachedUser).
    pub const CURRENT_USER: &str = "fragranza_user";

    /// Key for the Supabase access token.
    pub const ACCESS_TOKEN: &str = "fragranza_access_token";
}

/// Everything the session holds for a signed-in user.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub user: CachedUser,
    pub access_token: SecretString,
}
