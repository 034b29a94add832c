//! Authentication route handlers.
//!
//! Thin wrappers over [`AuthService`](crate::services::auth::AuthService):
//! extract, call, render the envelope.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::middleware::RequireAuth;
use crate::models::PendingUser;
use crate::routes::envelope;
use crate::services::ServiceResponse;
use crate::services::auth::{LoginForm, RegisterForm};
use crate::state::AppState;
use crate::supabase::ProfileUpdate;

/// Forgot password request body.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// What registration produced.
#[derive(Debug, Serialize)]
pub struct Registration {
    pub user: PendingUser,
    pub verification_email_sent: bool,
    /// Outcome of sending the verification email.
    pub verification_message: String,
}

/// Register with Supabase, then send the first verification email.
///
/// A failed verification email does not fail the registration; the
/// response says so and the user can resend from the verification page.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegisterForm>,
) -> Response {
    let email = form.email.clone();
    let password = form.password.clone();

    let registered = state.auth().register(&session, form).await;
    let Some(user) = registered.data else {
        return envelope(
            ServiceResponse::<()>::failure(registered.message),
            StatusCode::BAD_REQUEST,
        );
    };

    let verification = state
        .email_verification()
        .send_verification_email(&email, &password)
        .await;
    if !verification.success {
        tracing::warn!(user_id = %user.id, message = %verification.message, "Registered without verification email");
    }

    envelope(
        ServiceResponse::ok(
            registered.message,
            Registration {
                user,
                verification_email_sent: verification.success,
                verification_message: verification.message,
            },
        ),
        StatusCode::BAD_REQUEST,
    )
}

/// Sign in.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Response {
    envelope(
        state.auth().login(&session, form).await,
        StatusCode::UNAUTHORIZED,
    )
}

/// Sign out. Always succeeds.
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    envelope(state.auth().logout(&session).await, StatusCode::OK)
}

/// The current user, refreshed from Supabase.
pub async fn me(State(state): State<AppState>, session: Session) -> Response {
    envelope(
        state.auth().get_current_user(&session).await,
        StatusCode::UNAUTHORIZED,
    )
}

/// Update the signed-in user's names and phone.
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    envelope(
        state.auth().update_profile(&session, user.id(), update).await,
        StatusCode::BAD_REQUEST,
    )
}

/// Send the password recovery email.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(form): Json<ForgotPasswordForm>,
) -> Response {
    envelope(
        state.auth().reset_password(&form.email).await,
        StatusCode::BAD_REQUEST,
    )
}
