//! Qiita stock source.
//!
//! The sync engine only sees [`StockSource`]; [`QiitaClient`] is the real
//! implementation against the Qiita v2 API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Items requested per page; a shorter page is the last one
pub const STOCKS_PER_PAGE: usize = 100;

/// Platform label stored on leaves synced from Qiita
pub const QIITA_PLATFORM: &str = "qiita";

pub const DEFAULT_QIITA_API_BASE_URL: &str = "https://qiita.com/api/v2";

const QIITA_HTTP_TIMEOUT_SECS: u64 = 30;

/// A stocked Qiita article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<StockTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTag {
    pub name: String,
}

impl StockItem {
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.name.clone()).collect()
    }
}

/// One page of stocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StocksPage {
    pub items: Vec<StockItem>,
    pub has_more: bool,
}

impl StocksPage {
    /// Only a short page ends the feed
    pub fn from_items(items: Vec<StockItem>) -> Self {
        let has_more = items.len() >= STOCKS_PER_PAGE;
        Self { items, has_more }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid Qiita configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Qiita HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Qiita API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Paginated feed of stock items
#[async_trait]
pub trait StockSource: Send + Sync {
    /// Fetch page `page` (1-indexed)
    async fn list_stocks_page(&self, page: u32) -> FetchResult<StocksPage>;
}

/// Qiita API v2 client for one user's stocks
#[derive(Clone)]
pub struct QiitaClient {
    base_url: String,
    user_id: String,
    token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for QiitaClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("QiitaClient")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl QiitaClient {
    pub fn new(
        base_url: impl Into<String>,
        user_id: impl Into<String>,
        token: impl Into<String>,
    ) -> FetchResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let user_id = normalize_text_option(Some(user_id.into())).ok_or_else(|| {
            FetchError::InvalidConfiguration("Qiita user must not be empty".to_string())
        })?;
        let token = normalize_text_option(Some(token.into())).ok_or_else(|| {
            FetchError::InvalidConfiguration("Qiita token must not be empty".to_string())
        })?;

        Ok(Self {
            base_url,
            user_id,
            token,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(QIITA_HTTP_TIMEOUT_SECS))
                .build()?,
        })
    }

    fn stocks_endpoint(&self) -> String {
        format!(
            "{}/users/{}/stocks",
            self.base_url,
            urlencoding::encode(&self.user_id)
        )
    }
}

#[async_trait]
impl StockSource for QiitaClient {
    async fn list_stocks_page(&self, page: u32) -> FetchResult<StocksPage> {
        let response = self
            .client
            .get(self.stocks_endpoint())
            .query(&[
                ("per_page", STOCKS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ])
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let items = response.json::<Vec<StockItem>>().await?;
        tracing::debug!(page, count = items.len(), "Fetched Qiita stocks page");
        Ok(StocksPage::from_items(items))
    }
}

fn api_error(status: StatusCode, body: &str) -> FetchError {
    FetchError::Api {
        status: status.as_u16(),
        body: compact_text(body),
    }
}

fn normalize_base_url(raw: String) -> FetchResult<String> {
    let base = normalize_text_option(Some(raw)).ok_or_else(|| {
        FetchError::InvalidConfiguration("API base URL must not be empty".to_string())
    })?;
    if is_http_url(&base) {
        Ok(base.trim_end_matches('/').to_string())
    } else {
        Err(FetchError::InvalidConfiguration(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
