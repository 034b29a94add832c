//! Authentication extractors and session helpers.
//!
//! The signed-in state lives in the server-side session as two entries, the
//! cached user and the Supabase access token. The helpers here are the only
//! code that reads or writes those keys.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::Session;

use crate::models::{CachedUser, StoredSession, session_keys};

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email())
/// }
/// ```
pub struct RequireAuth(pub CachedUser);

/// Rejection when no user is signed in.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({
                "success": false,
                "message": "You are not logged in.",
            })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().ok_or(AuthRejection)?;

        let user: CachedUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection)?;

        Ok(Self(user))
    }
}

/// Write the cached user and access token together.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_session(
    session: &Session,
    user: &CachedUser,
    access_token: &SecretString,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await?;
    session
        .insert(session_keys::ACCESS_TOKEN, access_token.expose_secret())
        .await
}

/// Replace the cached user, keeping the access token.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_cached_user(
    session: &Session,
    user: &CachedUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// The access token, if any.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn load_access_token(
    session: &Session,
) -> Result<Option<SecretString>, tower_sessions::session::Error> {
    Ok(session
        .get::<String>(session_keys::ACCESS_TOKEN)
        .await?
        .map(SecretString::from))
}

/// Both entries, when both are present.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn load_session(
    session: &Session,
) -> Result<Option<StoredSession>, tower_sessions::session::Error> {
    let user = session.get::<CachedUser>(session_keys::CURRENT_USER).await?;
    let token = load_access_token(session).await?;

    Ok(user
        .zip(token)
        .map(|(user, access_token)| StoredSession { user, access_token }))
}

/// Remove both entries.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CachedUser>(session_keys::CURRENT_USER)
        .await?;
    session
        .remove::<String>(session_keys::ACCESS_TOKEN)
        .await?;
    Ok(())
}
