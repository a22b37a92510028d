//! Read-only HTTP access to the trading backend's REST collections.
//!
//! Every request carries the current session token, every collection response is
//! accepted both as a bare array and as a paginated envelope, and every record is
//! decoded individually so one bad row never costs the whole view.

use async_trait::async_trait;
use configuration::ApiConfig;
use core_types::{AgentStatus, Portfolio, Position, ReviewReport, Strategy, Trade};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod error;
pub mod history;
pub mod query;
pub mod responses;
pub mod session;

// --- Public API ---
pub use error::ApiError;
pub use history::{HistorySource, HttpHistorySource};
pub use query::{Collection, Query};
pub use responses::{ListResponse, Page};
pub use session::{Session, SessionState};

/// The abstract interface for reading the backend's collections.
///
/// The refresh engine only ever talks to this trait, so tests can substitute a
/// scripted implementation for the HTTP one.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn fetch_trades(&self, query: &Query) -> Result<Vec<Trade>, ApiError>;

    async fn fetch_positions(&self, query: &Query) -> Result<Vec<Position>, ApiError>;

    async fn fetch_strategies(&self, query: &Query) -> Result<Vec<Strategy>, ApiError>;

    async fn fetch_portfolios(&self, query: &Query) -> Result<Vec<Portfolio>, ApiError>;

    async fn fetch_agent_statuses(&self, query: &Query) -> Result<Vec<AgentStatus>, ApiError>;

    async fn fetch_review_reports(&self, query: &Query) -> Result<Vec<ReviewReport>, ApiError>;
}

/// The `reqwest`-backed implementation of [`ApiClient`].
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    auth_scheme: String,
    max_pages: usize,
    session: Session,
}

impl HttpClient {
    pub fn new(api_config: &ApiConfig, session: Session) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(api_config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: api_config.base_url.trim_end_matches('/').to_string(),
            auth_scheme: api_config.auth_scheme.clone(),
            max_pages: api_config.max_pages.max(1),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str, query: &Query) -> Result<String, ApiError> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let query_string = query.to_query_string()?;
        if query_string.is_empty() {
            Ok(format!("{}{}", self.base_url, path))
        } else {
            Ok(format!("{}{}?{}", self.base_url, path, query_string))
        }
    }

    /// Issues one authenticated GET and parses the body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let mut request = self.client.get(url);
        if let Some(token) = self.session.token() {
            request = request.header(AUTHORIZATION, format!("{} {}", self.auth_scheme, token));
        }

        tracing::debug!(url, "GET");
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate();
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Fetches every record of a list endpoint, following `next` links up to the
    /// page limit. A query's own page cap wins over the client-wide one.
    pub async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> Result<Vec<T>, ApiError> {
        let mut url = self.url(path, query)?;
        let mut records = Vec::new();
        let mut skipped = 0usize;
        let max_pages = query.page_cap().unwrap_or(self.max_pages).max(1);

        for page_number in 1..=max_pages {
            let body = self.get_json(&url).await?;
            let page: ListResponse = serde_json::from_value(body)
                .map_err(|e| ApiError::Deserialization(format!("{}: {}", path, e)))?;
            let (raw_records, next) = page.into_parts();

            for raw in raw_records {
                match serde_json::from_value::<T>(raw) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        skipped += 1;
                        tracing::warn!(path, error = %e, "Skipping a record that failed to decode.");
                    }
                }
            }

            match next {
                Some(link) if page_number < max_pages => url = link,
                Some(_) if query.page_cap().is_some() => break,
                Some(_) => {
                    tracing::warn!(
                        path,
                        max_pages,
                        "Page limit reached; the collection was truncated."
                    );
                    break;
                }
                None => break,
            }
        }

        tracing::debug!(path, count = records.len(), skipped, "Fetched collection.");
        Ok(records)
    }

    pub async fn fetch_collection<T: DeserializeOwned>(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<T>, ApiError> {
        self.fetch_list(collection.path(), query).await
    }
}

#[async_trait]
impl ApiClient for HttpClient {
    async fn fetch_trades(&self, query: &Query) -> Result<Vec<Trade>, ApiError> {
        self.fetch_collection(Collection::Trades, query).await
    }

    async fn fetch_positions(&self, query: &Query) -> Result<Vec<Position>, ApiError> {
        self.fetch_collection(Collection::Positions, query).await
    }

    async fn fetch_strategies(&self, query: &Query) -> Result<Vec<Strategy>, ApiError> {
        self.fetch_collection(Collection::Strategies, query).await
    }

    async fn fetch_portfolios(&self, query: &Query) -> Result<Vec<Portfolio>, ApiError> {
        self.fetch_collection(Collection::Portfolios, query).await
    }

    async fn fetch_agent_statuses(&self, query: &Query) -> Result<Vec<AgentStatus>, ApiError> {
        self.fetch_collection(Collection::AgentStatuses, query).await
    }

    async fn fetch_review_reports(&self, query: &Query) -> Result<Vec<ReviewReport>, ApiError> {
        self.fetch_collection(Collection::ReviewReports, query).await
    }
}
