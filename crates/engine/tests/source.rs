use analytics::ViewData;
use api_client::{ApiClient, ApiError, Collection, HistorySource, Query};
use async_trait::async_trait;
use configuration::DashboardConfig;
use core_types::{
    AccountType, AgentStatus, HistoryPoint, Numeric, Portfolio, Position, ReportType, ReviewReport,
    Strategy, StrategyStatus, Trade, TradeAction,
};
use engine::{ApiSnapshotSource, EngineError, Facet, SnapshotSource, ViewFilters, ViewKind};
use std::sync::{Arc, Mutex};

/// Answers every collection with one default record and remembers each query.
#[derive(Default)]
struct RecordingClient {
    queries: Mutex<Vec<(Collection, Query)>>,
    fail_on: Option<Collection>,
}

impl RecordingClient {
    fn record<T: Default>(&self, collection: Collection, query: &Query) -> Result<Vec<T>, ApiError> {
        self.queries.lock().unwrap().push((collection, query.clone()));
        if self.fail_on == Some(collection) {
            return Err(ApiError::Status { status: 502, body: String::new() });
        }
        Ok(vec![T::default()])
    }

    fn query_for(&self, collection: Collection) -> Query {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| *c == collection)
            .map(|(_, q)| q.clone())
            .unwrap_or_else(|| panic!("{collection} was never queried"))
    }
}

#[async_trait]
impl ApiClient for RecordingClient {
    async fn fetch_trades(&self, query: &Query) -> Result<Vec<Trade>, ApiError> {
        self.record(Collection::Trades, query)
    }

    async fn fetch_positions(&self, query: &Query) -> Result<Vec<Position>, ApiError> {
        self.record(Collection::Positions, query)
    }

    async fn fetch_strategies(&self, query: &Query) -> Result<Vec<Strategy>, ApiError> {
        self.record(Collection::Strategies, query)
    }

    async fn fetch_portfolios(&self, query: &Query) -> Result<Vec<Portfolio>, ApiError> {
        self.record(Collection::Portfolios, query)
    }

    async fn fetch_agent_statuses(&self, query: &Query) -> Result<Vec<AgentStatus>, ApiError> {
        self.record(Collection::AgentStatuses, query)
    }

    async fn fetch_review_reports(&self, query: &Query) -> Result<Vec<ReviewReport>, ApiError> {
        self.record(Collection::ReviewReports, query)
    }
}

#[derive(Default)]
struct FixedHistory {
    requested: Mutex<Vec<Option<AccountType>>>,
}

#[async_trait]
impl HistorySource for FixedHistory {
    async fn equity_history(
        &self,
        account_type: Option<AccountType>,
    ) -> Result<Vec<HistoryPoint>, ApiError> {
        self.requested.lock().unwrap().push(account_type);
        Ok(vec![HistoryPoint {
            timestamp: "2024-11-22T00:00:00Z".parse().unwrap(),
            value: Numeric::from("100000"),
        }])
    }
}

fn source(client: &Arc<RecordingClient>, history: Option<Arc<FixedHistory>>) -> ApiSnapshotSource {
    ApiSnapshotSource::new(
        client.clone(),
        history.map(|h| h as Arc<dyn HistorySource>),
        DashboardConfig::default(),
    )
}

#[tokio::test]
async fn dashboard_fetches_every_collection_with_its_query() {
    let client = Arc::new(RecordingClient::default());
    let data = source(&client, None)
        .fetch(ViewKind::Dashboard, &ViewFilters::default())
        .await
        .unwrap();

    let ViewData::Dashboard(data) = data else {
        panic!("expected dashboard data");
    };
    assert_eq!(data.trades.len(), 1);
    assert!(data.equity_history.is_none());

    assert_eq!(client.query_for(Collection::Portfolios).get("account_name"), Some("simulation_main"));
    assert_eq!(client.query_for(Collection::Strategies).get("status"), Some("active"));
    assert_eq!(client.query_for(Collection::Strategies).get("ordering"), Some("-score"));
    assert_eq!(client.query_for(Collection::Trades).get("page_size"), Some("10"));
    assert_eq!(client.query_for(Collection::Trades).page_cap(), Some(1));
    assert_eq!(client.query_for(Collection::Positions).get("is_closed"), Some("false"));
    assert!(client.query_for(Collection::AgentStatuses).is_empty());
}

#[tokio::test]
async fn dashboard_reads_recent_trades_in_one_request() {
    let client = Arc::new(RecordingClient::default());
    let dashboard = DashboardConfig { recent_trades: 5, ..Default::default() };
    let source = ApiSnapshotSource::new(client.clone(), None, dashboard);
    source.fetch(ViewKind::Dashboard, &ViewFilters::default()).await.unwrap();

    let queries = client.queries.lock().unwrap();
    let trade_queries: Vec<_> = queries.iter().filter(|(c, _)| *c == Collection::Trades).collect();
    assert_eq!(trade_queries.len(), 1);
    assert_eq!(trade_queries[0].1.get("page_size"), Some("5"));
    assert_eq!(trade_queries[0].1.get("ordering"), Some("-order_time"));
    assert_eq!(trade_queries[0].1.page_cap(), Some(1));
}

#[tokio::test]
async fn recognised_facets_are_pushed_down() {
    let client = Arc::new(RecordingClient::default());
    let source = source(&client, None);
    let filters = ViewFilters {
        strategy_status: Facet::Only(StrategyStatus::Paused),
        report_type: Facet::Only(ReportType::Weekly),
        account_type: Facet::Only(AccountType::Real),
        ..Default::default()
    };

    for view in [ViewKind::Strategies, ViewKind::Reports, ViewKind::Positions] {
        source.fetch(view, &filters).await.unwrap();
    }

    assert_eq!(client.query_for(Collection::Strategies).get("status"), Some("paused"));
    assert_eq!(client.query_for(Collection::ReviewReports).get("report_type"), Some("weekly"));
    assert_eq!(client.query_for(Collection::ReviewReports).get("ordering"), Some("-report_date"));
    assert_eq!(client.query_for(Collection::Positions).get("account_type"), Some("real"));
}

#[tokio::test]
async fn unrecognised_and_client_side_facets_stay_local() {
    let client = Arc::new(RecordingClient::default());
    let source = source(&client, None);
    let filters = ViewFilters {
        symbol: "600519".to_string(),
        action: Facet::Only(TradeAction::Buy),
        strategy_status: Facet::Unrecognized("archived".to_string()),
        ..Default::default()
    };

    source.fetch(ViewKind::Trades, &filters).await.unwrap();
    source.fetch(ViewKind::Strategies, &filters).await.unwrap();

    let trades = client.query_for(Collection::Trades);
    assert_eq!(trades.get("ordering"), Some("-order_time"));
    assert_eq!(trades.get("symbol"), None);
    assert_eq!(trades.get("action"), None);
    assert_eq!(client.query_for(Collection::Strategies).get("status"), None);
}

#[tokio::test]
async fn portfolio_history_follows_the_account_facet() {
    let client = Arc::new(RecordingClient::default());
    let history = Arc::new(FixedHistory::default());
    let filters = ViewFilters {
        account_type: Facet::Only(AccountType::Simulation),
        ..Default::default()
    };

    let data = source(&client, Some(history.clone()))
        .fetch(ViewKind::Portfolio, &filters)
        .await
        .unwrap();

    let ViewData::Portfolio(data) = data else {
        panic!("expected portfolio data");
    };
    assert_eq!(data.equity_history.map(|h| h.len()), Some(1));
    assert_eq!(*history.requested.lock().unwrap(), vec![Some(AccountType::Simulation)]);
    assert_eq!(client.query_for(Collection::Portfolios).get("account_type"), Some("simulation"));
}

#[tokio::test]
async fn any_failed_collection_fails_the_whole_view() {
    let client = Arc::new(RecordingClient {
        fail_on: Some(Collection::Positions),
        ..Default::default()
    });

    let result = source(&client, None)
        .fetch(ViewKind::Dashboard, &ViewFilters::default())
        .await;

    assert!(matches!(
        result,
        Err(EngineError::ApiClient(ApiError::Status { status: 502, .. }))
    ));
}
