//! Verification link handling.
//!
//! A verification email links back to `/auth/verify-email` with Firebase's
//! action code (`oobCode`, or `token` from older links), the `mode`, and the
//! `email` and `sig` we put in the continue URL. A [`VerificationAttempt`] is
//! built from those parameters and resolved once by [`VerificationAttempt::run`].
//!
//! The profile flag is only written for an address Firebase reported or one
//! whose signature checks out. Anyone can type `?email=`.

use serde::{Deserialize, Serialize};

use fragranza_core::Email;

use crate::error::add_breadcrumb;
use crate::firebase::{AuthErrorCode, EmailAuthProvider};
use crate::services::verification_link::LinkSigner;
use crate::supabase::IdentityBackend;

/// The only `mode` this page handles.
pub const VERIFY_EMAIL_MODE: &str = "verifyEmail";

pub mod messages {
    pub const VERIFIED: &str = "Your email has been verified. You can now log in.";
    pub const WRONG_ACTION: &str = "This link is not an email verification link.";
    pub const NO_TOKEN: &str =
        "No verification code found. Please use the link from your verification email.";
    pub const INVALID_CODE: &str =
        "This verification link is invalid or has already been used.";
    pub const EXPIRED_CODE: &str =
        "This verification link has expired. Please request a new one.";
    pub const FAILED: &str = "Email verification failed. Please try again later.";
}

/// Query parameters of a verification link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationParams {
    #[serde(rename = "oobCode")]
    pub oob_code: Option<String>,
    /// Legacy name for the action code.
    pub token: Option<String>,
    pub mode: Option<String>,
    pub email: Option<String>,
    /// Signature of `email`.
    pub sig: Option<String>,
}

impl VerificationParams {
    /// The action code, preferring `oobCode`. Empty values count as absent.
    #[must_use]
    pub fn action_code(&self) -> Option<&str> {
        non_empty(self.oob_code.as_deref()).or_else(|| non_empty(self.token.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Where an attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    Loading,
    Success,
    Error,
    NoToken,
}

/// One visit to the verification page. Never persisted.
#[derive(Debug)]
pub struct VerificationAttempt {
    action_code: Option<String>,
    mode: Option<String>,
    email_hint: Option<Email>,
    hint_signed: bool,
}

/// The resolved attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    /// Whether the page should offer the resend form.
    pub resend_available: bool,
}

impl VerificationOutcome {
    fn new(status: VerificationStatus, message: &str, email: Option<Email>) -> Self {
        Self {
            status,
            message: message.to_string(),
            email,
            resend_available: matches!(
                status,
                VerificationStatus::Error | VerificationStatus::NoToken
            ),
        }
    }
}

impl VerificationAttempt {
    /// Build from link parameters. An unparseable email hint is ignored.
    #[must_use]
    pub fn from_params(params: &VerificationParams, signer: &LinkSigner) -> Self {
        let email_hint = non_empty(params.email.as_deref()).and_then(|raw| match Email::parse(raw) {
            Ok(email) => Some(email),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid email hint on verification link");
                None
            }
        });
        let hint_signed = match (&email_hint, non_empty(params.sig.as_deref())) {
            (Some(email), Some(sig)) => signer.verify(email, sig),
            _ => false,
        };

        Self {
            action_code: params.action_code().map(str::to_string),
            mode: non_empty(params.mode.as_deref()).map(str::to_string),
            email_hint,
            hint_signed,
        }
    }

    /// Always `Loading`; an attempt only leaves it by being run.
    #[must_use]
    pub const fn status(&self) -> VerificationStatus {
        VerificationStatus::Loading
    }

    /// Resolve the attempt.
    pub async fn run<P, B>(self, provider: &P, backend: &B) -> VerificationOutcome
    where
        P: EmailAuthProvider,
        B: IdentityBackend,
    {
        if self.mode.as_deref().is_some_and(|m| m != VERIFY_EMAIL_MODE) {
            tracing::info!(mode = ?self.mode, "Verification page opened with another action");
            return VerificationOutcome::new(
                VerificationStatus::Error,
                messages::WRONG_ACTION,
                self.email_hint,
            );
        }

        let Some(code) = self.action_code else {
            return match self.email_hint {
                // Firebase already applied the code and redirected here.
                Some(email) => {
                    if self.hint_signed {
                        sync_profile(backend, &email).await;
                    } else {
                        tracing::info!(email = %email, "Unsigned email hint, profile left for login to sync");
                    }
                    add_breadcrumb("auth", "Email verified via continue URL", None);
                    VerificationOutcome::new(VerificationStatus::Success, messages::VERIFIED, Some(email))
                }
                None => VerificationOutcome::new(VerificationStatus::NoToken, messages::NO_TOKEN, None),
            };
        };

        match provider.apply_action_code(&code).await {
            Ok(verified) => {
                let signed_hint = self.email_hint.clone().filter(|_| self.hint_signed);
                if let Some(email) = verified.clone().or(signed_hint) {
                    sync_profile(backend, &email).await;
                }
                let email = verified.or(self.email_hint);
                add_breadcrumb("auth", "Email verified", None);
                tracing::info!(email = ?email.as_ref().map(Email::as_str), "Email verified");
                VerificationOutcome::new(VerificationStatus::Success, messages::VERIFIED, email)
            }
            Err(e) => {
                let code = e.code();
                let message = match code {
                    AuthErrorCode::ExpiredActionCode => messages::EXPIRED_CODE,
                    AuthErrorCode::InvalidActionCode => messages::INVALID_CODE,
                    _ => {
                        tracing::warn!(error = %e, "Failed to apply verification code");
                        messages::FAILED
                    }
                };
                add_breadcrumb(
                    "auth",
                    "Email verification failed",
                    Some(&[("code", code.as_str())]),
                );
                VerificationOutcome::new(VerificationStatus::Error, message, self.email_hint)
            }
        }
    }
}

/// Copy the confirmation into the profile. Failures are logged only.
async fn sync_profile<B: IdentityBackend>(backend: &B, email: &Email) {
    if let Err(e) = backend.mark_email_verified(email).await {
        tracing::warn!(email = %email, error = %e, "Failed to record email verification on profile");
    }
}
