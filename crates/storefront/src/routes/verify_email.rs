//! Email verification landing and resend.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;

use crate::routes::envelope;
use crate::services::verification_flow::{VerificationAttempt, VerificationOutcome, VerificationParams};
use crate::state::AppState;

/// Resend form, offered by the landing page after an error or a missing code.
#[derive(Debug, Deserialize)]
pub struct ResendForm {
    pub email: String,
    pub password: String,
}

/// Resolve a verification link.
///
/// Always 200; the outcome's `status` says what happened.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerificationParams>,
) -> Json<VerificationOutcome> {
    let verification = state.email_verification();
    let attempt = VerificationAttempt::from_params(&params, verification.link_signer());
    let outcome = attempt
        .run(verification.provider(), state.supabase())
        .await;
    Json(outcome)
}

/// Resend the verification email.
pub async fn resend(State(state): State<AppState>, Json(form): Json<ResendForm>) -> Response {
    envelope(
        state
            .email_verification()
            .resend_verification(&form.email, &form.password)
            .await,
        StatusCode::BAD_REQUEST,
    )
}
