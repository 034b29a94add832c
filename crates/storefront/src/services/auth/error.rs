//! Authentication error types.

use thiserror::Error;

use crate::supabase::SupabaseError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] fragranza_core::EmailError),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Supabase requires confirmation before sign-in.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// Sign-up did not answer in time.
    #[error("request timed out")]
    Timeout,

    /// Supabase could not be reached.
    #[error("network error: {0}")]
    Network(#[source] SupabaseError),

    /// Any other Supabase failure; its message is shown as is.
    #[error("backend error: {0}")]
    Backend(#[source] SupabaseError),

    /// No live session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Session store failure.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl From<SupabaseError> for AuthError {
    fn from(err: SupabaseError) -> Self {
        if err.is_network() {
            return Self::Network(err);
        }

        let message = err.message();
        if message.contains("Invalid login credentials") {
            Self::InvalidCredentials
        } else if message.contains("Email not confirmed") {
            Self::EmailNotConfirmed
        } else {
            Self::Backend(err)
        }
    }
}

impl AuthError {
    /// Text to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Invalid email address.".to_string(),
            Self::InvalidCredentials => "Invalid email or password.".to_string(),
            Self::EmailNotConfirmed => {
                "Please verify your email address before logging in.".to_string()
            }
            Self::Timeout => {
                "The request took too long. You may be sending requests too quickly; please wait a moment and try again."
                    .to_string()
            }
            Self::Network(_) => {
                "Could not reach the authentication service. Please check your connection and try again."
                    .to_string()
            }
            Self::Backend(err) => err.message(),
            Self::NotAuthenticated => "You are not logged in.".to_string(),
            Self::Session(_) => "Your session could not be saved. Please try again.".to_string(),
        }
    }
}
