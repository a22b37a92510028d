use crate::error::ApiError;
use crate::query::Query;
use crate::HttpClient;
use async_trait::async_trait;
use core_types::{AccountType, HistoryPoint};

/// A provider of time-bucketed history, such as daily account equity.
///
/// The backend stores only current totals, so trend charts need a separate
/// source. Views that have none report that explicitly instead of inventing data.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Equity points in ascending time order.
    async fn equity_history(
        &self,
        account_type: Option<AccountType>,
    ) -> Result<Vec<HistoryPoint>, ApiError>;
}

/// Reads history from a configured path on the same backend.
#[derive(Clone, Debug)]
pub struct HttpHistorySource {
    client: HttpClient,
    path: String,
}

impl HttpHistorySource {
    pub fn new(client: HttpClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }
}

#[async_trait]
impl HistorySource for HttpHistorySource {
    async fn equity_history(
        &self,
        account_type: Option<AccountType>,
    ) -> Result<Vec<HistoryPoint>, ApiError> {
        let query = match account_type {
            Some(account_type) => Query::new().account_type(account_type),
            None => Query::new(),
        };
        let mut points: Vec<HistoryPoint> = self.client.fetch_list(&self.path, &query).await?;
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }
}
