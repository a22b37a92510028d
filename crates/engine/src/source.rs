use crate::error::EngineError;
use crate::view::ViewKind;
use analytics::{DashboardData, Facet, PortfolioData, ViewData, ViewFilters};
use api_client::{ApiClient, HistorySource, Query};
use async_trait::async_trait;
use configuration::DashboardConfig;
use core_types::{AccountType, HistoryPoint, StrategyStatus};
use std::sync::Arc;

/// Where the raw collections for a view come from.
///
/// The scheduler only sees this trait, which keeps the refresh discipline
/// testable without a backend.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, view: ViewKind, filters: &ViewFilters) -> Result<ViewData, EngineError>;
}

/// Fetches view data from the backend REST API.
///
/// Enum facets the backend understands are pushed down as query parameters;
/// every facet is applied again locally when the snapshot is built, so a
/// backend that ignores a parameter still yields a correct view.
pub struct ApiSnapshotSource {
    client: Arc<dyn ApiClient>,
    history: Option<Arc<dyn HistorySource>>,
    dashboard: DashboardConfig,
}

impl ApiSnapshotSource {
    pub fn new(
        client: Arc<dyn ApiClient>,
        history: Option<Arc<dyn HistorySource>>,
        dashboard: DashboardConfig,
    ) -> Self {
        Self {
            client,
            history,
            dashboard,
        }
    }

    async fn equity_history(
        &self,
        account_type: Option<AccountType>,
    ) -> Result<Option<Vec<HistoryPoint>>, EngineError> {
        match &self.history {
            Some(source) => Ok(Some(source.equity_history(account_type).await?)),
            None => Ok(None),
        }
    }

    async fn dashboard(&self) -> Result<ViewData, EngineError> {
        let portfolio_query = Query::new().account_name(&self.dashboard.account_name);
        let agent_query = Query::new();
        let strategy_query = Query::new()
            .strategy_status(StrategyStatus::Active)
            .ordering("-score");
        let trade_query = Query::new()
            .ordering("-order_time")
            .page_size(self.dashboard.recent_trades)
            .first_page_only();
        let position_query = Query::new()
            .is_closed(false)
            .ordering("-unrealized_pnl_pct");

        let (portfolios, agents, strategies, trades, positions, equity_history) = tokio::try_join!(
            async { Ok::<_, EngineError>(self.client.fetch_portfolios(&portfolio_query).await?) },
            async { Ok::<_, EngineError>(self.client.fetch_agent_statuses(&agent_query).await?) },
            async { Ok::<_, EngineError>(self.client.fetch_strategies(&strategy_query).await?) },
            async { Ok::<_, EngineError>(self.client.fetch_trades(&trade_query).await?) },
            async { Ok::<_, EngineError>(self.client.fetch_positions(&position_query).await?) },
            self.equity_history(None),
        )?;

        Ok(ViewData::Dashboard(DashboardData {
            portfolios,
            agents,
            strategies,
            trades,
            positions,
            equity_history,
        }))
    }

    async fn portfolio(&self, filters: &ViewFilters) -> Result<ViewData, EngineError> {
        let account_type = filters.account_type.selected().copied();
        let mut portfolio_query = Query::new();
        let mut position_query = Query::new().is_closed(false);
        if let Some(account_type) = account_type {
            portfolio_query = portfolio_query.account_type(account_type);
            position_query = position_query.account_type(account_type);
        }

        let (portfolios, positions, equity_history) = tokio::try_join!(
            async { Ok::<_, EngineError>(self.client.fetch_portfolios(&portfolio_query).await?) },
            async { Ok::<_, EngineError>(self.client.fetch_positions(&position_query).await?) },
            self.equity_history(account_type),
        )?;

        Ok(ViewData::Portfolio(PortfolioData {
            portfolios,
            positions,
            equity_history,
        }))
    }
}

/// Pushes a facet down to the backend when it selects a recognised value.
fn push_facet<T>(query: Query, facet: &Facet<T>, apply: impl FnOnce(Query, T) -> Query) -> Query
where
    T: Copy,
{
    match facet.selected() {
        Some(value) => apply(query, *value),
        None => query,
    }
}

#[async_trait]
impl SnapshotSource for ApiSnapshotSource {
    async fn fetch(&self, view: ViewKind, filters: &ViewFilters) -> Result<ViewData, EngineError> {
        tracing::debug!(%view, "Fetching view data.");
        let data = match view {
            ViewKind::Dashboard => self.dashboard().await?,
            ViewKind::Portfolio => self.portfolio(filters).await?,
            ViewKind::Agents => {
                ViewData::Agents(self.client.fetch_agent_statuses(&Query::new()).await?)
            }
            ViewKind::Positions => {
                let query = push_facet(
                    Query::new().is_closed(false),
                    &filters.account_type,
                    Query::account_type,
                );
                ViewData::Positions(self.client.fetch_positions(&query).await?)
            }
            ViewKind::Trades => {
                let query = Query::new().ordering("-order_time");
                ViewData::Trades(self.client.fetch_trades(&query).await?)
            }
            ViewKind::Strategies => {
                let query = push_facet(
                    Query::new().ordering("-score"),
                    &filters.strategy_status,
                    Query::strategy_status,
                );
                ViewData::Strategies(self.client.fetch_strategies(&query).await?)
            }
            ViewKind::Reports => {
                let query = push_facet(
                    Query::new().ordering("-report_date"),
                    &filters.report_type,
                    Query::report_type,
                );
                ViewData::Reports(self.client.fetch_review_reports(&query).await?)
            }
        };
        Ok(data)
    }
}
