//! Authentication service.
//!
//! Sign-up and sign-in go to Supabase; the verification email and the
//! verified flag come from Firebase through [`EmailVerificationService`].
//! The signed-in user is cached in the server-side session and re-derived
//! from the live Supabase session on demand.

mod error;

pub use error::AuthError;

use std::time::Duration;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;

use fragranza_core::{Email, Role, UserId};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::firebase::EmailAuthProvider;
use crate::middleware::auth::{
    clear_session, load_access_token, load_session, store_cached_user, store_session,
};
use crate::models::{CachedUser, PendingUser, User};
use crate::services::ServiceResponse;
use crate::services::email_verification::{EmailVerificationService, VerificationState};
use crate::supabase::{IdentityBackend, ProfileUpdate, SignUpMetadata, SignUpRequest};

pub mod messages {
    pub const REGISTERED: &str =
        "Registration successful. Please check your email to verify your account.";
    pub const LOGGED_IN: &str = "Login successful.";
    pub const LOGGED_OUT: &str = "You have been logged out.";
    pub const CURRENT_USER: &str = "Current user loaded.";
    pub const PROFILE_UPDATED: &str = "Profile updated.";
    pub const RESET_SENT: &str =
        "If an account exists for this email, a password reset link has been sent.";
}

/// Registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Login form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Authentication service.
///
/// Borrowed from [`AppState`](crate::state::AppState) per request.
pub struct AuthService<'a, B, P> {
    backend: &'a B,
    verifier: &'a EmailVerificationService<P>,
    register_timeout: Duration,
    reset_redirect: &'a str,
}

impl<'a, B, P> AuthService<'a, B, P>
where
    B: IdentityBackend,
    P: EmailAuthProvider,
{
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        backend: &'a B,
        verifier: &'a EmailVerificationService<P>,
        register_timeout: Duration,
        reset_redirect: &'a str,
    ) -> Self {
        Self {
            backend,
            verifier,
            register_timeout,
            reset_redirect,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Create a Supabase account.
    ///
    /// The `profiles` row is created by a database trigger from the
    /// metadata. The result is a [`PendingUser`]: what was submitted, not
    /// what Supabase has confirmed.
    pub async fn register(
        &self,
        session: &Session,
        form: RegisterForm,
    ) -> ServiceResponse<PendingUser> {
        respond(self.try_register(session, form).await, messages::REGISTERED)
    }

    async fn try_register(
        &self,
        session: &Session,
        form: RegisterForm,
    ) -> Result<PendingUser, AuthError> {
        let email = Email::parse(&form.email)?;
        let phone = form.phone.filter(|p| !p.trim().is_empty());

        let request = SignUpRequest {
            email: email.clone(),
            password: form.password,
            data: SignUpMetadata {
                first_name: form.first_name,
                last_name: form.last_name,
                phone,
                role: Role::Customer,
            },
        };

        let response = tokio::time::timeout(self.register_timeout, self.backend.sign_up(&request))
            .await
            .map_err(|_| {
                tracing::warn!(email = %email, timeout = ?self.register_timeout, "Sign-up timed out");
                AuthError::Timeout
            })??;

        let SignUpRequest { data, .. } = request;
        let pending = PendingUser {
            id: response.user().id,
            email,
            first_name: data.first_name,
            last_name: data.last_name,
            phone: data.phone,
            role: data.role,
            submitted_at: Utc::now(),
        };

        if let Some(auth) = response.session() {
            store_session(
                session,
                &CachedUser::Pending(pending.clone()),
                &SecretString::from(auth.access_token.clone()),
            )
            .await?;
        }

        tracing::info!(user_id = %pending.id, email = %pending.email, "User registered");
        Ok(pending)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Sign in and cache the user.
    pub async fn login(&self, session: &Session, form: LoginForm) -> ServiceResponse<User> {
        respond(self.try_login(session, form).await, messages::LOGGED_IN)
    }

    async fn try_login(&self, session: &Session, form: LoginForm) -> Result<User, AuthError> {
        let email = Email::parse(&form.email)?;
        let auth = self
            .backend
            .sign_in_with_password(&email, &form.password)
            .await?;

        let profile = match self.backend.fetch_profile(&auth.access_token, auth.user.id).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(user_id = %auth.user.id, error = %e, "Profile fetch failed, using auth metadata");
                None
            }
        };

        let state = self
            .verifier
            .verification_state(email.as_str(), &form.password)
            .await;
        let profile_verified = profile.as_ref().is_some_and(|p| p.email_verified);
        // Firebase saying "unverified" outranks the profile column.
        let email_verified = state != VerificationState::Unverified;

        if state == VerificationState::Verified && !profile_verified {
            if let Err(e) = self.backend.mark_email_verified(&email).await {
                tracing::warn!(email = %email, error = %e, "Failed to sync email verification to profile");
            }
        }

        let user = match profile {
            Some(profile) => User::from_profile(profile, email, email_verified),
            None => User::from_auth_metadata(&auth.user, email, email_verified),
        };

        store_session(
            session,
            &CachedUser::Confirmed(user.clone()),
            &SecretString::from(auth.access_token),
        )
        .await?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        tracing::info!(user_id = %user.id, email_verified, "User logged in");
        Ok(user)
    }

    /// Sign out of Supabase and clear the cached session.
    ///
    /// The cache is cleared even when Supabase sign-out fails.
    pub async fn logout(&self, session: &Session) -> ServiceResponse {
        match load_access_token(session).await {
            Ok(Some(token)) => {
                if let Err(e) = self.backend.sign_out(token.expose_secret()).await {
                    tracing::warn!(error = %e, "Supabase sign-out failed");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Could not read access token"),
        }

        if let Err(e) = clear_session(session).await {
            tracing::error!(error = %e, "Failed to clear session");
        }
        clear_sentry_user();

        ServiceResponse::ok_message(messages::LOGGED_OUT)
    }

    /// Re-derive the user from the live Supabase session and overwrite the
    /// cache.
    ///
    /// A missing or rejected token clears the cache.
    pub async fn get_current_user(&self, session: &Session) -> ServiceResponse<User> {
        respond(self.try_current_user(session).await, messages::CURRENT_USER)
    }

    async fn try_current_user(&self, session: &Session) -> Result<User, AuthError> {
        let Some(token) = load_access_token(session).await? else {
            clear_session(session).await?;
            return Err(AuthError::NotAuthenticated);
        };

        let auth = match self.backend.get_user(token.expose_secret()).await {
            Ok(auth) => auth,
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Access token rejected, clearing session");
                clear_session(session).await?;
                return Err(AuthError::NotAuthenticated);
            }
            Err(e) => return Err(e.into()),
        };

        let email = match auth.email.as_deref().map(Email::parse) {
            Some(Ok(email)) => email,
            Some(Err(e)) => return Err(e.into()),
            None => match load_session(session).await? {
                Some(stored) => stored.user.email().clone(),
                None => return Err(AuthError::NotAuthenticated),
            },
        };

        let user = match self
            .backend
            .fetch_profile(token.expose_secret(), auth.id)
            .await
        {
            Ok(profile) => {
                let verified = profile.email_verified;
                User::from_profile(profile, email, verified)
            }
            Err(e) => {
                tracing::warn!(user_id = %auth.id, error = %e, "Profile fetch failed, using auth metadata");
                User::from_auth_metadata(&auth, email, false)
            }
        };

        store_cached_user(session, &CachedUser::Confirmed(user.clone())).await?;
        Ok(user)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Update names and phone, then refresh the cached user.
    pub async fn update_profile(
        &self,
        session: &Session,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> ServiceResponse<User> {
        respond(
            self.try_update_profile(session, user_id, &update).await,
            messages::PROFILE_UPDATED,
        )
    }

    async fn try_update_profile(
        &self,
        session: &Session,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, AuthError> {
        let token = load_access_token(session)
            .await?
            .ok_or(AuthError::NotAuthenticated)?;

        if !update.is_empty() {
            self.backend
                .update_profile(token.expose_secret(), user_id, update)
                .await?;
            tracing::info!(user_id = %user_id, "Profile updated");
        }

        self.try_current_user(session).await
    }

    /// Send Supabase's password recovery email.
    ///
    /// Reports success whether or not the account exists; only transport
    /// failures are surfaced.
    pub async fn reset_password(&self, email: &str) -> ServiceResponse {
        let email = match Email::parse(email) {
            Ok(email) => email,
            Err(e) => return ServiceResponse::failure(AuthError::from(e).user_message()),
        };

        match self
            .backend
            .reset_password_for_email(&email, self.reset_redirect)
            .await
        {
            Ok(()) => ServiceResponse::ok_message(messages::RESET_SENT),
            Err(e) if e.is_network() => ServiceResponse::failure(AuthError::from(e).user_message()),
            Err(e) => {
                tracing::info!(email = %email, error = %e, "Password reset request rejected");
                ServiceResponse::ok_message(messages::RESET_SENT)
            }
        }
    }
}

/// Turn a service result into the response envelope.
fn respond<T>(result: Result<T, AuthError>, success: &str) -> ServiceResponse<T> {
    match result {
        Ok(data) => ServiceResponse::ok(success, data),
        Err(e) => {
            match &e {
                AuthError::Session(_) => tracing::error!(error = %e, "Auth session failure"),
                AuthError::Backend(_) | AuthError::Network(_) | AuthError::Timeout => {
                    tracing::warn!(error = %e, "Auth request failed");
                }
                _ => tracing::debug!(error = %e, "Auth request rejected"),
            }
            ServiceResponse::failure(e.user_message())
        }
    }
}
