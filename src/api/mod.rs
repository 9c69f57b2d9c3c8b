pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use types::*;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid base URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx answer; `detail` is the backend's `{detail}` message when it sent one.
    #[error("{detail}")]
    Status { status: u16, detail: String },

    #[error("failed to decode response: {source}")]
    Decode {
        #[source]
        source: reqwest::Error,
    },

    #[error("response is missing `{field}`")]
    MissingField { field: &'static str },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The backend routes the front end talks to.
///
/// [`HttpApi`] is the production implementation; tests substitute an in-memory one.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn categories(&self) -> Result<Vec<Category>, ApiError>;

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ApiError>;

    async fn item_details(&self, item_id: i64) -> Result<ItemDetails, ApiError>;

    async fn create_user(&self) -> Result<CreatedUser, ApiError>;

    async fn record_event(&self, event: &NewEvent) -> Result<(), ApiError>;

    async fn stats(&self) -> Result<SystemStats, ApiError>;

    async fn popular_items(&self, limit: u32) -> Result<Vec<PopularItem>, ApiError>;

    async fn active_users(&self, limit: u32) -> Result<Vec<ActiveUser>, ApiError>;

    async fn recent_events(&self, limit: u32) -> Result<Vec<RecentEvent>, ApiError>;

    async fn recommendations(&self, user_id: &str) -> Result<Recommendations, ApiError>;
}

#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpApi {
    /// `timeout` of `None` lets a hung request wait forever, like the browser front end.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base_url = parse_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::ClientBuild { source: e })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Url {
        // base_url always ends in '/', so joining a relative path cannot fail
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    fn endpoint_with_limit(&self, path: &str, limit: u32) -> Url {
        let mut url = self.endpoint(path);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(%url, "GET");
        read_json(send(self.client.get(url)).await?).await
    }
}

#[async_trait]
impl CatalogApi for HttpApi {
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json(self.endpoint("catalog/categories")).await
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        let mut url = self.endpoint("catalog/search");
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        self.get_json(url).await
    }

    async fn item_details(&self, item_id: i64) -> Result<ItemDetails, ApiError> {
        self.get_json(self.endpoint(&format!("catalog/items/{item_id}")))
            .await
    }

    async fn create_user(&self) -> Result<CreatedUser, ApiError> {
        let url = self.endpoint("users/");
        tracing::debug!(%url, "POST");
        let request = self.client.post(url).json(&serde_json::json!({}));
        read_json(send(request).await?).await
    }

    async fn record_event(&self, event: &NewEvent) -> Result<(), ApiError> {
        let url = self.endpoint("events/");
        tracing::debug!(%url, item_id = event.item_id, event_type = %event.event_type, "POST");
        send(self.client.post(url).json(event)).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<SystemStats, ApiError> {
        self.get_json(self.endpoint("analytics/stats")).await
    }

    async fn popular_items(&self, limit: u32) -> Result<Vec<PopularItem>, ApiError> {
        self.get_json(self.endpoint_with_limit("analytics/popular-items", limit))
            .await
    }

    async fn active_users(&self, limit: u32) -> Result<Vec<ActiveUser>, ApiError> {
        self.get_json(self.endpoint_with_limit("analytics/active-users", limit))
            .await
    }

    async fn recent_events(&self, limit: u32) -> Result<Vec<RecentEvent>, ApiError> {
        self.get_json(self.endpoint_with_limit("analytics/recent-events", limit))
            .await
    }

    async fn recommendations(&self, user_id: &str) -> Result<Recommendations, ApiError> {
        let mut url = self.endpoint("recommendations/");
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(user_id);
        }
        self.get_json(url).await
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let raw = raw.trim();
    let mut url = Url::parse(raw).map_err(|e| ApiError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl {
            url: raw.to_string(),
            message: "expected an http(s) URL".to_string(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Transport { source: e })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        detail: error_detail(status.as_u16(), &body),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode { source: e })
}

/// Extracts `{detail}` from an error body. FastAPI validation errors carry a
/// list there, which is passed through as JSON text.
pub(crate) fn error_detail(status: u16, body: &[u8]) -> String {
    let fallback = || format!("HTTP error! status: {status}");
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return fallback();
    };
    match value.get("detail") {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(serde_json::Value::Null) | None => fallback(),
        Some(serde_json::Value::String(_)) => fallback(),
        Some(other) => other.to_string(),
    }
}
