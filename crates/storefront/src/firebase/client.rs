//! Identity Toolkit REST client.
//!
//! Talks to `https://identitytoolkit.googleapis.com/v1/accounts:*`, the same
//! endpoints the Firebase JS SDK uses under the hood.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use fragranza_core::Email;

use super::{AuthErrorCode, EmailAccount, EmailAuthProvider, FirebaseError};
use crate::config::FirebaseConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    local_id: String,
    email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    continue_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyCodeRequest<'a> {
    oob_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApplyCodeResponse {
    email: Option<String>,
}

/// Ignores whatever a call returns.
#[derive(Debug, Deserialize)]
struct Empty {}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Firebase Identity Toolkit REST API.
///
/// Cheap to clone; construct once at startup and share.
#[derive(Clone)]
pub struct FirebaseClient {
    inner: Arc<FirebaseClientInner>,
}

struct FirebaseClientInner {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl FirebaseClient {
    /// Create a new Identity Toolkit client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            inner: Arc::new(FirebaseClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            }),
        }
    }

    /// POST to `accounts:{method}` and decode the JSON response.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, FirebaseError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!(
            "{}/accounts:{method}?key={}",
            self.inner.endpoint,
            urlencoding::encode(self.inner.api_key.expose_secret())
        );

        let response = self.inner.client.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!(method, status = status.as_u16(), "Identity Toolkit call failed");
            return Err(parse_error_body(&text));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FirebaseError::Parse(e.to_string()))
    }

    async fn lookup_verified(&self, id_token: &str) -> Result<bool, FirebaseError> {
        let lookup: LookupResponse = self
            .call("lookup", &IdTokenRequest { id_token })
            .await?;

        lookup
            .users
            .first()
            .map(|user| user.email_verified)
            .ok_or_else(|| FirebaseError::from(AuthErrorCode::UserNotFound))
    }

    fn account_from_token(
        token: TokenResponse,
        fallback_email: &Email,
        email_verified: bool,
    ) -> EmailAccount {
        let email = token
            .email
            .as_deref()
            .and_then(|e| Email::parse(e).ok())
            .unwrap_or_else(|| fallback_email.clone());

        EmailAccount {
            local_id: token.local_id,
            email,
            email_verified,
            id_token: SecretString::from(token.id_token),
        }
    }
}

impl EmailAuthProvider for FirebaseClient {
    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<EmailAccount, FirebaseError> {
        let token: TokenResponse = self
            .call(
                "signUp",
                &PasswordRequest {
                    email: email.as_str(),
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        // New accounts always start unverified.
        Ok(Self::account_from_token(token, email, false))
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<EmailAccount, FirebaseError> {
        let token: TokenResponse = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email: email.as_str(),
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let email_verified = self.lookup_verified(&token.id_token).await?;
        Ok(Self::account_from_token(token, email, email_verified))
    }

    async fn sign_out(&self, account: EmailAccount) {
        // The REST API keeps no server-side session; dropping the ID token is
        // all a sign-out amounts to.
        tracing::debug!(local_id = %account.local_id, "Released Firebase session");
        drop(account);
    }

    async fn send_email_verification(
        &self,
        account: &EmailAccount,
        continue_url: &str,
    ) -> Result<(), FirebaseError> {
        let _: Empty = self
            .call(
                "sendOobCode",
                &OobCodeRequest {
                    request_type: "VERIFY_EMAIL",
                    id_token: Some(account.id_token.expose_secret()),
                    email: None,
                    continue_url: Some(continue_url),
                },
            )
            .await?;
        Ok(())
    }

    async fn apply_action_code(&self, code: &str) -> Result<Option<Email>, FirebaseError> {
        let response: ApplyCodeResponse = self
            .call("update", &ApplyCodeRequest { oob_code: code })
            .await?;

        Ok(response.email.and_then(|e| Email::parse(&e).ok()))
    }

    async fn send_password_reset_email(&self, email: &Email) -> Result<(), FirebaseError> {
        let _: Empty = self
            .call(
                "sendOobCode",
                &OobCodeRequest {
                    request_type: "PASSWORD_RESET",
                    id_token: None,
                    email: Some(email.as_str()),
                    continue_url: None,
                },
            )
            .await?;
        Ok(())
    }

    async fn delete_account(&self, account: &EmailAccount) -> Result<(), FirebaseError> {
        let _: Empty = self
            .call(
                "delete",
                &IdTokenRequest {
                    id_token: account.id_token.expose_secret(),
                },
            )
            .await?;
        Ok(())
    }
}

/// Turn an Identity Toolkit error body into a [`FirebaseError`].
fn parse_error_body(body: &str) -> FirebaseError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => FirebaseError::Auth {
            code: AuthErrorCode::from_rest_message(&envelope.error.message),
            message: envelope.error.message,
        },
        Err(_) => FirebaseError::Parse(format!("unexpected error body: {body}")),
    }
}
