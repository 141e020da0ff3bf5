use reqwest::{
    Client, Response,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Errors surfaced by the Supabase REST layer. Cells translate these into
/// their own domain errors; `Conflict` carries unique-constraint violations
/// (Postgres 23505 comes back from PostgREST as HTTP 409).
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected response ({status}): {body}")]
    Unexpected { status: u16, body: String },
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.anon_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        headers
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Response, DbError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Supabase error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                404 => DbError::NotFound(error_text),
                409 => DbError::Conflict(error_text),
                _ => DbError::Unexpected {
                    status: status.as_u16(),
                    body: error_text,
                },
            });
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    /// Like `request`, with extra headers merged in. Callers use this for
    /// PostgREST `Prefer` headers such as `return=representation`.
    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, extra_headers).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Issue a request and discard the response body. PostgREST answers
    /// DELETE, and PATCH without a Prefer header, with 204 No Content.
    pub async fn request_no_content(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(), DbError> {
        self.send(method, path, body, None).await?;
        Ok(())
    }
}
