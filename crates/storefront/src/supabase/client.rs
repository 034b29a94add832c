//! Supabase REST client (GoTrue + PostgREST).

use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};

use fragranza_core::{Email, UserId};

use super::query::{PostgrestQuery, Selection, parse_content_range};
use super::{
    AuthSession, AuthUser, CatalogBackend, IdentityBackend, Profile, ProfileUpdate,
    SignUpRequest, SignUpResponse, SupabaseError,
};
use crate::config::SupabaseConfig;

/// Error body shapes used by GoTrue and PostgREST.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
    code: Option<serde_json::Value>,
}

impl ErrorBody {
    fn into_error(self, status: u16, raw: &str) -> SupabaseError {
        let code = self.error_code.or_else(|| match self.code {
            Some(serde_json::Value::String(code)) => Some(code),
            _ => None,
        });
        let message = self
            .msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| raw.to_string());

        SupabaseError::Api {
            status,
            code,
            message,
        }
    }
}

/// Supabase REST client.
///
/// Cheap to clone; construct once at startup and share.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    url: String,
    anon_key: SecretString,
    service_role_key: Option<SecretString>,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| SupabaseError::Parse(format!("Invalid anon key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                url: config.url.trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
                service_role_key: config.service_role_key.clone(),
            }),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.inner.url)
    }

    fn rest_url(&self, table: &str, query: &str) -> String {
        format!("{}/rest/v1/{table}?{query}", self.inner.url)
    }

    /// Request authorized as the anon role.
    fn anon(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(self.inner.anon_key.expose_secret())
    }

    /// Request authorized with the service role, bypassing row level security.
    fn service(&self, builder: RequestBuilder) -> Result<RequestBuilder, SupabaseError> {
        let key = self
            .inner
            .service_role_key
            .as_ref()
            .ok_or(SupabaseError::ServiceRoleMissing)?
            .expose_secret();
        Ok(builder.header("apikey", key).bearer_auth(key))
    }

    async fn send(builder: RequestBuilder) -> Result<Response, SupabaseError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();
        Err(body.into_error(status.as_u16(), &raw))
    }

    async fn json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, SupabaseError> {
        Self::send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| SupabaseError::Parse(e.to_string()))
    }
}

impl IdentityBackend for SupabaseClient {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, SupabaseError> {
        let builder = self.inner.client.post(self.auth_url("signup")).json(request);
        Self::json(self.anon(builder)).await
    }

    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let builder = self
            .inner
            .client
            .post(self.auth_url("token?grant_type=password"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        Self::json(self.anon(builder)).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let builder = self
            .inner
            .client
            .post(self.auth_url("logout"))
            .bearer_auth(access_token);
        Self::send(builder).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let builder = self
            .inner
            .client
            .get(self.auth_url("user"))
            .bearer_auth(access_token);
        Self::json(builder).await
    }

    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: UserId,
    ) -> Result<Profile, SupabaseError> {
        let query = PostgrestQuery::new().eq("id", user_id).range(0, 0);
        let builder = self
            .inner
            .client
            .get(self.rest_url("profiles", &query.to_query_string()))
            .bearer_auth(access_token);

        let rows: Vec<Profile> = Self::json(builder).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("profile {user_id}")))
    }

    async fn update_profile(
        &self,
        access_token: &str,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), SupabaseError> {
        let mut body = serde_json::to_value(update).map_err(|e| SupabaseError::Parse(e.to_string()))?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("updated_at".to_string(), serde_json::json!(Utc::now()));
        }

        let query = PostgrestQuery::new().eq("id", user_id).to_query_string();
        let builder = self
            .inner
            .client
            .patch(self.rest_url("profiles", &query))
            .bearer_auth(access_token)
            .header("Prefer", "return=minimal")
            .json(&body);
        Self::send(builder).await?;
        Ok(())
    }

    async fn mark_email_verified(&self, email: &Email) -> Result<(), SupabaseError> {
        let query = PostgrestQuery::new()
            .eq("email", email)
            .columns("id")
            .to_query_string();
        let builder = self
            .inner
            .client
            .patch(self.rest_url("profiles", &query))
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({
                "email_verified": true,
                "updated_at": Utc::now(),
            }));

        let updated: Vec<serde_json::Value> = Self::json(self.service(builder)?).await?;
        if updated.is_empty() {
            return Err(SupabaseError::NotFound(format!("profile for {email}")));
        }
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &Email,
        redirect_to: &str,
    ) -> Result<(), SupabaseError> {
        let url = format!(
            "{}?redirect_to={}",
            self.auth_url("recover"),
            urlencoding::encode(redirect_to)
        );
        let builder = self
            .inner
            .client
            .post(url)
            .json(&serde_json::json!({ "email": email }));
        Self::send(self.anon(builder)).await?;
        Ok(())
    }
}

impl CatalogBackend for SupabaseClient {
    async fn select<T>(&self, table: &str, query: &PostgrestQuery) -> Result<Selection<T>, SupabaseError>
    where
        T: DeserializeOwned + Send,
    {
        let mut builder = self
            .inner
            .client
            .get(self.rest_url(table, &query.to_query_string()));
        if query.wants_count() {
            builder = builder.header("Prefer", "count=exact");
        }

        let response = Self::send(self.anon(builder)).await?;
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);

        let rows = response
            .json::<Vec<T>>()
            .await
            .map_err(|e| SupabaseError::Parse(e.to_string()))?;

        Ok(Selection { rows, total })
    }
}
