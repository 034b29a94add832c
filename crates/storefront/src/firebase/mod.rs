//! Firebase Authentication, used purely as an email delivery channel.
//!
//! Accounts created here are throwaway identities: they exist so Firebase
//! can send verification and password-reset emails and remember whether the
//! address was confirmed. Supabase remains the identity store.
//!
//! # Sessions
//!
//! Signing in yields an [`EmailAccount`] handle holding the ID token. The
//! handle is not `Clone`, and [`EmailAuthProvider::sign_out`] consumes it, so
//! a caller cannot keep using a session it has released.

mod client;

pub use client::FirebaseClient;

use std::future::Future;

use secrecy::SecretString;
use thiserror::Error;

use fragranza_core::Email;

/// Error codes reported by Firebase Auth, named after the JS SDK codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    EmailAlreadyInUse,
    WrongPassword,
    InvalidCredential,
    UserNotFound,
    InvalidEmail,
    WeakPassword,
    InvalidActionCode,
    ExpiredActionCode,
    TooManyRequests,
    UserDisabled,
    NetworkRequestFailed,
    Internal,
}

impl AuthErrorCode {
    /// Map an Identity Toolkit REST error message (e.g. `EMAIL_EXISTS` or
    /// `WEAK_PASSWORD : Password should be at least 6 characters`).
    #[must_use]
    pub fn from_rest_message(message: &str) -> Self {
        let key = message
            .split([':', ' '])
            .next()
            .unwrap_or_default()
            .trim();

        match key {
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "INVALID_PASSWORD" => Self::WrongPassword,
            "INVALID_LOGIN_CREDENTIALS" | "INVALID_ID_TOKEN" => Self::InvalidCredential,
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => Self::UserNotFound,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "INVALID_OOB_CODE" => Self::InvalidActionCode,
            "EXPIRED_OOB_CODE" => Self::ExpiredActionCode,
            "TOO_MANY_ATTEMPTS_TRY_LATER" | "QUOTA_EXCEEDED" => Self::TooManyRequests,
            "USER_DISABLED" => Self::UserDisabled,
            _ => Self::Internal,
        }
    }

    /// The JS SDK style code, e.g. `auth/expired-action-code`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::UserNotFound => "auth/user-not-found",
            Self::InvalidEmail => "auth/invalid-email",
            Self::WeakPassword => "auth/weak-password",
            Self::InvalidActionCode => "auth/invalid-action-code",
            Self::ExpiredActionCode => "auth/expired-action-code",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::UserDisabled => "auth/user-disabled",
            Self::NetworkRequestFailed => "auth/network-request-failed",
            Self::Internal => "auth/internal-error",
        }
    }

    /// Rejected credentials, whichever way Firebase phrases it.
    #[must_use]
    pub const fn is_bad_credentials(self) -> bool {
        matches!(self, Self::WrongPassword | Self::InvalidCredential)
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when talking to Firebase Auth.
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Firebase rejected the request.
    #[error("{code}: {message}")]
    Auth {
        code: AuthErrorCode,
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl FirebaseError {
    /// The SDK error code this failure corresponds to.
    #[must_use]
    pub const fn code(&self) -> AuthErrorCode {
        match self {
            Self::Auth { code, .. } => *code,
            Self::Http(_) => AuthErrorCode::NetworkRequestFailed,
            Self::Parse(_) => AuthErrorCode::Internal,
        }
    }
}

impl From<AuthErrorCode> for FirebaseError {
    fn from(code: AuthErrorCode) -> Self {
        Self::Auth {
            code,
            message: code.as_str().to_string(),
        }
    }
}

/// A signed-in Firebase account.
#[derive(Debug)]
pub struct EmailAccount {
    /// Firebase user ID (`localId`).
    pub local_id: String,
    /// Email address Firebase has on file.
    pub email: Email,
    /// Whether Firebase considers the address verified.
    pub email_verified: bool,
    /// ID token authorizing calls on behalf of this account.
    pub id_token: SecretString,
}

/// Operations the verification flow needs from the email delivery vendor.
pub trait EmailAuthProvider: Send + Sync {
    /// Create an account and sign in to it.
    fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> impl Future<Output = Result<EmailAccount, FirebaseError>> + Send;

    /// Sign in with email and password, including the verified flag.
    fn sign_in(
        &self,
        email: &Email,
        password: &str,
    ) -> impl Future<Output = Result<EmailAccount, FirebaseError>> + Send;

    /// Release a session. Never fails; there is nothing left to act on.
    fn sign_out(&self, account: EmailAccount) -> impl Future<Output = ()> + Send;

    /// Send the verification email; the link returns to `continue_url`.
    fn send_email_verification(
        &self,
        account: &EmailAccount,
        continue_url: &str,
    ) -> impl Future<Output = Result<(), FirebaseError>> + Send;

    /// Apply an out-of-band action code from an email link.
    ///
    /// Returns the address the code verified, when Firebase reports one.
    fn apply_action_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Email>, FirebaseError>> + Send;

    /// Send a password reset email.
    fn send_password_reset_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<(), FirebaseError>> + Send;

    /// Delete the signed-in account.
    fn delete_account(
        &self,
        account: &EmailAccount,
    ) -> impl Future<Output = Result<(), FirebaseError>> + Send;
}
