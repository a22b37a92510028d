use crate::error::ApiError;
use core_types::{AccountType, ReportType, StrategyStatus, TradeStatus};
use std::collections::BTreeMap;
use std::fmt;

/// The backend collections the dashboard reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Trades,
    Positions,
    Portfolios,
    Strategies,
    AgentStatuses,
    ReviewReports,
}

impl Collection {
    /// Path relative to the configured API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Collection::Trades => "/trades/trades/",
            Collection::Positions => "/trades/positions/",
            Collection::Portfolios => "/trades/portfolio/",
            Collection::Strategies => "/strategies/",
            Collection::AgentStatuses => "/agents/status/",
            Collection::ReviewReports => "/reports/reviews/",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Server-side filtering and ordering for a collection fetch.
///
/// Parameters are held in a sorted map so the encoded query string is stable,
/// which keeps request logs and test matchers deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: BTreeMap<&'static str, String>,
    /// Caps how many pages the client follows. Never sent to the backend.
    max_pages: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an arbitrary parameter, replacing any previous value.
    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.params.insert(key, value.to_string());
        self
    }

    /// Backend ordering expression, e.g. `-order_time` for newest first.
    pub fn ordering(self, field: &str) -> Self {
        self.param("ordering", field)
    }

    /// Records per page. The backend paginates by page number and ignores `limit`.
    pub fn page_size(self, size: usize) -> Self {
        self.param("page_size", size)
    }

    /// Fetches only the first page, for "most recent N" reads.
    pub fn first_page_only(mut self) -> Self {
        self.max_pages = Some(1);
        self
    }

    pub fn page_cap(&self) -> Option<usize> {
        self.max_pages
    }

    pub fn trade_status(self, status: TradeStatus) -> Self {
        self.param("status", status.as_str())
    }

    pub fn strategy_status(self, status: StrategyStatus) -> Self {
        self.param("status", status.as_str())
    }

    pub fn account_type(self, account_type: AccountType) -> Self {
        self.param("account_type", account_type.as_str())
    }

    pub fn account_name(self, name: &str) -> Self {
        self.param("account_name", name)
    }

    pub fn is_closed(self, closed: bool) -> Self {
        self.param("is_closed", closed)
    }

    pub fn report_type(self, report_type: ReportType) -> Self {
        self.param("report_type", report_type.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> Result<String, ApiError> {
        serde_qs::to_string(&self.params).map_err(|e| ApiError::Query(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_in_key_order() {
        let query = Query::new()
            .ordering("-order_time")
            .trade_status(TradeStatus::Filled)
            .account_type(AccountType::Simulation)
            .page_size(10);
        assert_eq!(
            query.to_query_string().unwrap(),
            "account_type=simulation&ordering=-order_time&page_size=10&status=filled"
        );
    }

    #[test]
    fn later_values_replace_earlier_ones() {
        let query = Query::new().page_size(5).page_size(20);
        assert_eq!(query.get("page_size"), Some("20"));
    }

    #[test]
    fn page_cap_stays_out_of_the_query_string() {
        let query = Query::new().page_size(10).first_page_only();
        assert_eq!(query.page_cap(), Some(1));
        assert_eq!(query.to_query_string().unwrap(), "page_size=10");
        assert_eq!(Query::new().page_cap(), None);
    }

    #[test]
    fn empty_query_encodes_to_empty_string() {
        assert!(Query::new().is_empty());
        assert_eq!(Query::new().to_query_string().unwrap(), "");
    }
}
