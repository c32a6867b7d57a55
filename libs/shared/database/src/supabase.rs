use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

/// PostgREST client for the backing Supabase project. Authenticates with the
/// service key; row-level authorization is not a concern of this API.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.service_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        additional_headers: Option<HeaderMap>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers();
        if let Some(add_headers) = additional_headers {
            for (name, value) in add_headers.iter() {
                headers.insert(name.clone(), value.clone());
            }
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    DatabaseError::Unauthorized(error_text)
                }
                StatusCode::NOT_FOUND => DatabaseError::NotFound(error_text),
                StatusCode::CONFLICT => DatabaseError::Conflict(error_text),
                _ => DatabaseError::Api {
                    status: status.as_u16(),
                    body: error_text,
                },
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            // DELETE and minimal-return writes produce empty bodies.
            return serde_json::from_slice(b"null")
                .map_err(|e| DatabaseError::Decode(e.to_string()));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            let body_text = String::from_utf8_lossy(&bytes);
            error!("Failed to parse response: {} - Raw body: {}", e, body_text);
            DatabaseError::Decode(e.to_string())
        })
    }

    /// POST a row and return the stored representation.
    pub async fn insert_returning<T>(&self, table_path: &str, row: Value) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self
            .request_with_headers(Method::POST, table_path, Some(row), Some(Self::return_representation()))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DatabaseError::Decode("insert returned no rows".to_string()))
    }

    /// PATCH rows matched by `path`'s filters and return the first updated row.
    pub async fn patch_returning<T>(&self, path: &str, changes: Value) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self
            .request_with_headers(Method::PATCH, path, Some(changes), Some(Self::return_representation()))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DatabaseError::NotFound("no row matched the update".to_string()))
    }

    /// Call a Postgres function through PostgREST. Used where a use case needs
    /// several writes inside one transaction.
    pub async fn rpc<T>(&self, function: &str, args: Value) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/rpc/{function}");
        self.request(Method::POST, &path, Some(args)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), DatabaseError> {
        let _: Value = self.request(Method::DELETE, path, None).await?;
        Ok(())
    }

    fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
