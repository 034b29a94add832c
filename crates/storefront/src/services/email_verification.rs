//! Email verification through Firebase.
//!
//! Supabase owns identities; Firebase is only used to send verification and
//! reset emails and to remember whether an address was confirmed. For that,
//! every registered email gets a shadow Firebase account with the same
//! password. This service manages those accounts.
//!
//! # Sessions
//!
//! Each operation signs in, does its work, and signs out before returning,
//! on success and failure alike. The service holds no state between calls.

use fragranza_core::Email;

use crate::firebase::{AuthErrorCode, EmailAccount, EmailAuthProvider, FirebaseError};
use crate::services::ServiceResponse;
use crate::services::verification_link::LinkSigner;

/// User-facing messages.
pub mod messages {
    pub const VERIFICATION_SENT: &str =
        "Verification email sent. Please check your inbox and click the link to verify your account.";
    pub const VERIFICATION_RESENT: &str =
        "Verification email resent. Please check your inbox.";
    pub const ALREADY_VERIFIED: &str = "Your email is already verified. You can log in.";
    pub const INVALID_CREDENTIALS: &str =
        "An account with this email already exists, but the password is incorrect.";
    pub const INVALID_EMAIL: &str = "Invalid email address.";
    pub const WEAK_PASSWORD: &str = "Password is too weak. Please use at least 6 characters.";
    pub const SEND_FAILED: &str = "Failed to send verification email. Please try again later.";
    pub const WRONG_PASSWORD: &str = "Incorrect password. Please try again.";
    pub const ACCOUNT_NOT_FOUND: &str = "No account found with this email. Please register first.";
    pub const TOO_MANY_REQUESTS: &str =
        "Too many requests. Please wait a few minutes before trying again.";
    pub const RESEND_FAILED: &str = "Failed to resend verification email. Please try again later.";
    pub const RESET_SENT: &str =
        "If an account exists for this email, a password reset link has been sent.";
    pub const RESET_FAILED: &str = "Failed to send password reset email. Please try again later.";
}

/// What Firebase knows about an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// Signed in and Firebase reports the address verified.
    Verified,
    /// Signed in and Firebase reports the address unverified.
    Unverified,
    /// Could not find out: no Firebase account, rejected credentials, or an
    /// error. Common for accounts created before email verification existed.
    Unknown,
}

/// Email verification service.
///
/// Generic over the provider so tests can run without Firebase.
pub struct EmailVerificationService<P> {
    provider: P,
    verify_url: String,
    signer: LinkSigner,
}

impl<P: EmailAuthProvider> EmailVerificationService<P> {
    /// Create a new service.
    ///
    /// `verify_url` is the landing page verification links return to;
    /// `signer` signs the address those links carry.
    pub fn new(provider: P, verify_url: impl Into<String>, signer: LinkSigner) -> Self {
        Self {
            provider,
            verify_url: verify_url.into(),
            signer,
        }
    }

    /// The underlying provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Signer for the address on verification links.
    pub const fn link_signer(&self) -> &LinkSigner {
        &self.signer
    }

    /// Continue URL carrying the signed address, so the landing page can
    /// sync the profile even when Firebase applies the code itself.
    fn continue_url(&self, email: &Email) -> String {
        let mut url = format!(
            "{}?email={}",
            self.verify_url,
            urlencoding::encode(email.as_str())
        );
        match self.signer.sign(email) {
            Some(sig) => {
                url.push_str("&sig=");
                url.push_str(&sig);
            }
            None => tracing::warn!(email = %email, "Could not sign verification link"),
        }
        url
    }

    /// Send the verification email on `account`, then sign out.
    async fn send_then_sign_out(&self, account: EmailAccount) -> Result<(), FirebaseError> {
        let result = self
            .provider
            .send_email_verification(&account, &self.continue_url(&account.email))
            .await;
        self.provider.sign_out(account).await;
        result
    }

    /// Create the Firebase account for `email` and send the first
    /// verification email.
    ///
    /// If the account already exists, signs in with the same password and
    /// resends instead (or reports it already verified).
    pub async fn send_verification_email(&self, email: &str, password: &str) -> ServiceResponse {
        let Ok(email) = Email::parse(email) else {
            return ServiceResponse::failure(messages::INVALID_EMAIL);
        };

        match self.provider.create_account(&email, password).await {
            Ok(account) => match self.send_then_sign_out(account).await {
                Ok(()) => {
                    tracing::info!(email = %email, "Verification email sent");
                    ServiceResponse::ok_message(messages::VERIFICATION_SENT)
                }
                Err(e) => {
                    tracing::warn!(email = %email, error = %e, "Failed to send verification email");
                    ServiceResponse::failure(messages::SEND_FAILED)
                }
            },
            Err(e) if e.code() == AuthErrorCode::EmailAlreadyInUse => {
                self.resend_for_existing(&email, password).await
            }
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "Failed to create Firebase account");
                match e.code() {
                    AuthErrorCode::InvalidEmail => ServiceResponse::failure(messages::INVALID_EMAIL),
                    AuthErrorCode::WeakPassword => ServiceResponse::failure(messages::WEAK_PASSWORD),
                    _ => ServiceResponse::failure(messages::SEND_FAILED),
                }
            }
        }
    }

    /// Fallback of `send_verification_email` for an existing account.
    async fn resend_for_existing(&self, email: &Email, password: &str) -> ServiceResponse {
        let account = match self.provider.sign_in(email, password).await {
            Ok(account) => account,
            Err(e) if e.code().is_bad_credentials() => {
                tracing::info!(email = %email, "Existing Firebase account rejected password");
                return ServiceResponse::failure(messages::INVALID_CREDENTIALS);
            }
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "Sign-in to existing Firebase account failed");
                return ServiceResponse::failure(messages::SEND_FAILED);
            }
        };

        if account.email_verified {
            self.provider.sign_out(account).await;
            return ServiceResponse::ok_message(messages::ALREADY_VERIFIED);
        }

        match self.send_then_sign_out(account).await {
            Ok(()) => ServiceResponse::ok_message(messages::VERIFICATION_RESENT),
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "Failed to resend verification email");
                ServiceResponse::failure(messages::SEND_FAILED)
            }
        }
    }

    /// Resend the verification email for an existing account.
    pub async fn resend_verification(&self, email: &str, password: &str) -> ServiceResponse {
        let Ok(email) = Email::parse(email) else {
            return ServiceResponse::failure(messages::INVALID_EMAIL);
        };

        let account = match self.provider.sign_in(&email, password).await {
            Ok(account) => account,
            Err(e) => {
                tracing::info!(email = %email, error = %e, "Resend sign-in failed");
                return ServiceResponse::failure(resend_failure_message(e.code()));
            }
        };

        if account.email_verified {
            self.provider.sign_out(account).await;
            return ServiceResponse::ok_message(messages::ALREADY_VERIFIED);
        }

        match self.send_then_sign_out(account).await {
            Ok(()) => {
                tracing::info!(email = %email, "Verification email resent");
                ServiceResponse::ok_message(messages::VERIFICATION_SENT)
            }
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "Failed to resend verification email");
                ServiceResponse::failure(resend_failure_message(e.code()))
            }
        }
    }

    /// What Firebase knows about `email`, signing out afterwards.
    pub async fn verification_state(&self, email: &str, password: &str) -> VerificationState {
        let Ok(email) = Email::parse(email) else {
            return VerificationState::Unknown;
        };

        match self.provider.sign_in(&email, password).await {
            Ok(account) => {
                let verified = account.email_verified;
                self.provider.sign_out(account).await;
                if verified {
                    VerificationState::Verified
                } else {
                    VerificationState::Unverified
                }
            }
            Err(e) => {
                match e.code() {
                    AuthErrorCode::UserNotFound => {
                        tracing::debug!(email = %email, "No Firebase account; predates email verification");
                    }
                    code if code.is_bad_credentials() => {
                        tracing::debug!(email = %email, "Firebase password differs from Supabase");
                    }
                    _ => tracing::warn!(email = %email, error = %e, "Firebase verification check failed"),
                }
                VerificationState::Unknown
            }
        }
    }

    /// Whether login should treat `email` as verified.
    ///
    /// Fails open: only an explicit "unverified" from Firebase returns
    /// `false`. Suitable for nudging the user, not for access control.
    pub async fn check_email_verified(&self, email: &str, password: &str) -> bool {
        self.verification_state(email, password).await != VerificationState::Unverified
    }

    /// Send a Firebase password reset email.
    ///
    /// Reports success for unknown addresses so the response does not reveal
    /// which emails have accounts.
    pub async fn send_password_reset_email(&self, email: &str) -> ServiceResponse {
        let Ok(email) = Email::parse(email) else {
            return ServiceResponse::failure(messages::INVALID_EMAIL);
        };

        match self.provider.send_password_reset_email(&email).await {
            Ok(()) => ServiceResponse::ok_message(messages::RESET_SENT),
            Err(e) => match e.code() {
                AuthErrorCode::UserNotFound => ServiceResponse::ok_message(messages::RESET_SENT),
                AuthErrorCode::InvalidEmail => ServiceResponse::failure(messages::INVALID_EMAIL),
                AuthErrorCode::TooManyRequests => {
                    ServiceResponse::failure(messages::TOO_MANY_REQUESTS)
                }
                _ => {
                    tracing::warn!(email = %email, error = %e, "Failed to send password reset email");
                    ServiceResponse::failure(messages::RESET_FAILED)
                }
            },
        }
    }

    /// Delete the Firebase account for `email`. Best effort; failures are
    /// logged and otherwise ignored.
    pub async fn delete_firebase_user(&self, email: &str, password: &str) {
        let Ok(email) = Email::parse(email) else {
            tracing::warn!("Skipping Firebase account deletion for invalid email");
            return;
        };

        let account = match self.provider.sign_in(&email, password).await {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "Could not sign in to delete Firebase account");
                return;
            }
        };

        match self.provider.delete_account(&account).await {
            Ok(()) => tracing::info!(email = %email, "Deleted Firebase account"),
            Err(e) => tracing::warn!(email = %email, error = %e, "Failed to delete Firebase account"),
        }
        self.provider.sign_out(account).await;
    }
}

fn resend_failure_message(code: AuthErrorCode) -> &'static str {
    match code {
        AuthErrorCode::WrongPassword | AuthErrorCode::InvalidCredential => messages::WRONG_PASSWORD,
        AuthErrorCode::UserNotFound => messages::ACCOUNT_NOT_FOUND,
        AuthErrorCode::TooManyRequests => messages::TOO_MANY_REQUESTS,
        _ => messages::RESEND_FAILED,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeEmailProvider, Op, test_signer};

    const EMAIL: &str = "giulia@fragranza.it";
    const PASSWORD: &str = "Bergamotto!42";

    fn service(provider: FakeEmailProvider) -> EmailVerificationService<FakeEmailProvider> {
        EmailVerificationService::new(
            provider,
            "https://shop.fragranza.test/auth/verify-email",
            test_signer(),
        )
    }

    #[tokio::test]
    async fn test_send_creates_account_and_signs_out() {
        let svc = service(FakeEmailProvider::new());

        let response = svc.send_verification_email(EMAIL, PASSWORD).await;

        assert!(response.success);
        assert_eq!(response.message, messages::VERIFICATION_SENT);
        assert_eq!(svc.provider().active_sessions(), 0);
        assert_eq!(
            svc.provider().sent_verifications(),
            vec![format!(
                "https://shop.fragranza.test/auth/verify-email?email={}&sig={}",
                urlencoding::encode(EMAIL),
                test_signer().sign(&Email::parse(EMAIL).unwrap()).unwrap()
            )]
        );
    }

    #[tokio::test]
    async fn test_send_twice_resends_and_leaves_no_session() {
        let svc = service(FakeEmailProvider::new());

        let first = svc.send_verification_email(EMAIL, PASSWORD).await;
        assert_eq!(svc.provider().active_sessions(), 0);

        let second = svc.send_verification_email(EMAIL, PASSWORD).await;

        assert!(first.success);
        assert!(second.success);
        assert_eq!(second.message, messages::VERIFICATION_RESENT);
        assert_eq!(svc.provider().active_sessions(), 0);
        assert_eq!(svc.provider().sent_verifications().len(), 2);
    }

    #[tokio::test]
    async fn test_send_existing_verified_account() {
        let provider = FakeEmailProvider::new().with_account(EMAIL, PASSWORD, true);
        let svc = service(provider);

        let response = svc.send_verification_email(EMAIL, PASSWORD).await;

        assert!(response.success);
        assert_eq!(response.message, messages::ALREADY_VERIFIED);
        assert!(svc.provider().sent_verifications().is_empty());
        assert_eq!(svc.provider().active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_send_existing_account_wrong_password() {
        let provider = FakeEmailProvider::new().with_account(EMAIL, "something-else", false);
        let svc = service(provider);

        let response = svc.send_verification_email(EMAIL, PASSWORD).await;

        assert!(!response.success);
        assert_eq!(response.message, messages::INVALID_CREDENTIALS);
        assert_eq!(svc.provider().active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_send_maps_creation_errors() {
        let svc = service(FakeEmailProvider::new().fail(Op::CreateAccount, AuthErrorCode::WeakPassword));
        let response = svc.send_verification_email(EMAIL, "123").await;
        assert_eq!(response.message, messages::WEAK_PASSWORD);

        let svc = service(FakeEmailProvider::new().fail(Op::CreateAccount, AuthErrorCode::Internal));
        let response = svc.send_verification_email(EMAIL, PASSWORD).await;
        assert_eq!(response.message, messages::SEND_FAILED);

        let svc = service(FakeEmailProvider::new());
        let response = svc.send_verification_email("not-an-email", PASSWORD).await;
        assert_eq!(response.message, messages::INVALID_EMAIL);
        assert_eq!(svc.provider().calls(), 0);
    }

    #[tokio::test]
    async fn test_send_failure_after_sign_in_still_signs_out() {
        let provider = FakeEmailProvider::new()
            .fail(Op::SendVerification, AuthErrorCode::TooManyRequests);
        let svc = service(provider);

        let response = svc.send_verification_email(EMAIL, PASSWORD).await;

        assert!(!response.success);
        assert_eq!(svc.provider().active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_resend_unverified() {
        let provider = FakeEmailProvider::new().with_account(EMAIL, PASSWORD, false);
        let svc = service(provider);

        let response = svc.resend_verification(EMAIL, PASSWORD).await;

        assert!(response.success);
        assert_eq!(svc.provider().sent_verifications().len(), 1);
        assert_eq!(svc.provider().active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_resend_already_verified() {
        let provider = FakeEmailProvider::new().with_account(EMAIL, PASSWORD, true);
        let svc = service(provider);

        let response = svc.resend_verification(EMAIL, PASSWORD).await;

        assert!(response.success);
        assert_eq!(response.message, messages::ALREADY_VERIFIED);
        assert_eq!(svc.provider().active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_resend_error_messages() {
        let svc = service(FakeEmailProvider::new().with_account(EMAIL, "other", false));
        assert_eq!(
            svc.resend_verification(EMAIL, PASSWORD).await.message,
            messages::WRONG_PASSWORD
        );

        let svc = service(FakeEmailProvider::new());
        assert_eq!(
            svc.resend_verification(EMAIL, PASSWORD).await.message,
            messages::ACCOUNT_NOT_FOUND
        );

        let svc = service(
            FakeEmailProvider::new()
                .with_account(EMAIL, PASSWORD, false)
                .fail(Op::SignIn, AuthErrorCode::TooManyRequests),
        );
        assert_eq!(
            svc.resend_verification(EMAIL, PASSWORD).await.message,
            messages::TOO_MANY_REQUESTS
        );

        let svc = service(
            FakeEmailProvider::new()
                .with_account(EMAIL, PASSWORD, false)
                .fail(Op::SignIn, AuthErrorCode::NetworkRequestFailed),
        );
        assert_eq!(
            svc.resend_verification(EMAIL, PASSWORD).await.message,
            messages::RESEND_FAILED
        );
    }

    #[tokio::test]
    async fn test_check_email_verified_fails_open() {
        // No Firebase account at all.
        let svc = service(FakeEmailProvider::new());
        assert!(svc.check_email_verified(EMAIL, PASSWORD).await);

        // Wrong password.
        let svc = service(FakeEmailProvider::new().with_account(EMAIL, "other", false));
        assert!(svc.check_email_verified(EMAIL, PASSWORD).await);

        // Anything else.
        let svc = service(
            FakeEmailProvider::new()
                .with_account(EMAIL, PASSWORD, false)
                .fail(Op::SignIn, AuthErrorCode::Internal),
        );
        assert!(svc.check_email_verified(EMAIL, PASSWORD).await);
        assert_eq!(
            svc.verification_state(EMAIL, PASSWORD).await,
            VerificationState::Unknown
        );
    }

    #[tokio::test]
    async fn test_check_email_verified_reports_explicit_flag() {
        let svc = service(FakeEmailProvider::new().with_account(EMAIL, PASSWORD, false));
        assert!(!svc.check_email_verified(EMAIL, PASSWORD).await);
        assert_eq!(svc.provider().active_sessions(), 0);

        let svc = service(FakeEmailProvider::new().with_account(EMAIL, PASSWORD, true));
        assert!(svc.check_email_verified(EMAIL, PASSWORD).await);
        assert_eq!(
            svc.verification_state(EMAIL, PASSWORD).await,
            VerificationState::Verified
        );
        assert_eq!(svc.provider().active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_password_reset_hides_missing_accounts() {
        let svc = service(FakeEmailProvider::new());
        let response = svc.send_password_reset_email("nobody@x.com").await;
        assert!(response.success);
        assert_eq!(response.message, messages::RESET_SENT);

        let svc = service(FakeEmailProvider::new().with_account(EMAIL, PASSWORD, true));
        let response = svc.send_password_reset_email(EMAIL).await;
        assert!(response.success);
        assert_eq!(response.message, messages::RESET_SENT);
    }

    #[tokio::test]
    async fn test_password_reset_surfaces_other_failures() {
        let svc = service(
            FakeEmailProvider::new().fail(Op::SendPasswordReset, AuthErrorCode::Internal),
        );
        let response = svc.send_password_reset_email(EMAIL).await;
        assert!(!response.success);
        assert_eq!(response.message, messages::RESET_FAILED);
    }

    #[tokio::test]
    async fn test_delete_is_best_effort() {
        let svc = service(FakeEmailProvider::new().with_account(EMAIL, PASSWORD, false));
        svc.delete_firebase_user(EMAIL, PASSWORD).await;
        assert!(!svc.provider().has_account(EMAIL));
        assert_eq!(svc.provider().active_sessions(), 0);

        // Missing account and failing delete are both swallowed.
        let svc = service(FakeEmailProvider::new());
        svc.delete_firebase_user(EMAIL, PASSWORD).await;

        let svc = service(
            FakeEmailProvider::new()
                .with_account(EMAIL, PASSWORD, false)
                .fail(Op::DeleteAccount, AuthErrorCode::Internal),
        );
        svc.delete_firebase_user(EMAIL, PASSWORD).await;
        assert!(svc.provider().has_account(EMAIL));
        assert_eq!(svc.provider().active_sessions(), 0);
    }
}
