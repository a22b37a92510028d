//! Per-view snapshot assembly.
//!
//! A snapshot is built in one go from the raw collections of one refresh
//! cycle: filter, aggregate, then project into series. Nothing from an
//! earlier cycle is reused.

use crate::aggregate::{self, HUNDRED};
use crate::engine::AnalyticsEngine;
use crate::filter::ViewFilters;
use crate::series::{self, CategorySeries, MetricFn, MultiSeries, SeriesPoint, Trend};
use crate::stats::{
    AgentStats, PnlBreakdown, PortfolioSummary, PositionStats, ReviewStats, StrategyStats,
    TradeStats,
};
use chrono::{DateTime, Utc};
use core_types::{
    AgentState, AgentStatus, AgentType, HistoryPoint, Portfolio, Position, ReportType,
    ReviewReport, Strategy, StrategyStatus, Trade, TradeAction, TradeStatus,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// How many entries the truncated charts and lists show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLimits {
    pub recent_trades: usize,
    pub top_positions: usize,
    pub top_strategies: usize,
    pub compare_limit: usize,
    pub trend_limit: usize,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            recent_trades: 10,
            top_positions: 5,
            top_strategies: 5,
            compare_limit: 8,
            trend_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub portfolios: Vec<Portfolio>,
    pub agents: Vec<AgentStatus>,
    pub strategies: Vec<Strategy>,
    pub trades: Vec<Trade>,
    pub positions: Vec<Position>,
    /// `None` when no history source is configured.
    pub equity_history: Option<Vec<HistoryPoint>>,
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioData {
    pub portfolios: Vec<Portfolio>,
    pub positions: Vec<Position>,
    pub equity_history: Option<Vec<HistoryPoint>>,
}

/// The raw collections fetched for one view in one cycle.
#[derive(Debug, Clone)]
pub enum ViewData {
    Dashboard(DashboardData),
    Agents(Vec<AgentStatus>),
    Portfolio(PortfolioData),
    Positions(Vec<Position>),
    Trades(Vec<Trade>),
    Strategies(Vec<Strategy>),
    Reports(Vec<ReviewReport>),
}

/// The display-relevant slice of one agent's status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRow {
    pub agent_type: Option<AgentType>,
    pub status: Option<AgentState>,
    pub current_task: Option<String>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// `None` when the agent does not report one.
    pub success_rate: Option<Decimal>,
    pub avg_response_time: Decimal,
    pub tasks_completed: u64,
    pub error_count: u64,
    pub last_error: Option<String>,
}

impl From<&AgentStatus> for AgentRow {
    fn from(agent: &AgentStatus) -> Self {
        Self {
            agent_type: agent.agent_type,
            status: agent.status,
            current_task: agent.current_task.clone(),
            last_heartbeat: agent.last_heartbeat,
            success_rate: agent.metrics.success_rate.get(),
            avg_response_time: agent.metrics.avg_response_time.value(),
            tasks_completed: agent.metrics.tasks_completed,
            error_count: agent.error_count,
            last_error: agent.last_error.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub portfolio: Option<PortfolioSummary>,
    pub agents: AgentStats,
    pub agent_rows: Vec<AgentRow>,
    pub position_count: usize,
    /// The largest positions by market value.
    pub top_positions: CategorySeries,
    /// `return_pct` and `win_rate` of the best-scoring strategies.
    pub strategy_performance: MultiSeries,
    pub recent_trades: Vec<Trade>,
    pub equity_trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentsSnapshot {
    pub stats: AgentStats,
    /// In pipeline layer order.
    pub agents: Vec<AgentRow>,
    pub status_distribution: CategorySeries,
    /// Per-agent performance over time has no backing source yet.
    pub performance_history: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub summary: Option<PortfolioSummary>,
    pub positions: PositionStats,
    /// `market_value` and `unrealized_pnl` per position.
    pub position_distribution: MultiSeries,
    pub pnl_breakdown: PnlBreakdown,
    pub pnl_distribution: CategorySeries,
    pub equity_trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionsSnapshot {
    pub stats: PositionStats,
    /// Ranked by market value.
    pub value_distribution: CategorySeries,
    /// `pnl` and `pnl_pct`, ranked by pnl.
    pub pnl_ranking: MultiSeries,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradesSnapshot {
    pub stats: TradeStats,
    pub action_distribution: CategorySeries,
    pub status_distribution: CategorySeries,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategiesSnapshot {
    pub stats: StrategyStats,
    /// `return_pct`, `win_rate`, `sharpe` and `score` of the top strategies.
    pub comparison: MultiSeries,
    /// Radar profile of the best-scoring strategy.
    pub top_profile: Option<CategorySeries>,
    pub status_distribution: CategorySeries,
    /// Ranked by score.
    pub strategies: Vec<Strategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportsSnapshot {
    pub stats: ReviewStats,
    pub trend: MultiSeries,
    pub type_distribution: CategorySeries,
    /// Newest first.
    pub reports: Vec<ReviewReport>,
}

/// One complete, immutable set of derived statistics for one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewSnapshot {
    Dashboard(DashboardSnapshot),
    Agents(AgentsSnapshot),
    Portfolio(PortfolioSnapshot),
    Positions(PositionsSnapshot),
    Trades(TradesSnapshot),
    Strategies(StrategiesSnapshot),
    Reports(ReportsSnapshot),
}

fn strategy_label(strategy: &Strategy) -> String {
    strategy.name.clone()
}

fn agents_in_layer_order(agents: &[AgentStatus]) -> Vec<AgentRow> {
    let mut rows: Vec<AgentRow> = agents.iter().map(AgentRow::from).collect();
    // Unknown layers go last; `sort_by` keeps the backend order within a layer.
    rows.sort_by(|a, b| match (a.agent_type, b.agent_type) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    rows
}

fn newest_trades_first(trades: &[Trade]) -> Vec<Trade> {
    let mut sorted = trades.to_vec();
    sorted.sort_by(|a, b| b.order_time.cmp(&a.order_time));
    sorted
}

impl AnalyticsEngine {
    /// Builds the snapshot for whichever view `data` belongs to.
    pub fn build(&self, data: ViewData, filters: &ViewFilters, limits: &SnapshotLimits) -> ViewSnapshot {
        match data {
            ViewData::Dashboard(data) => {
                if !filters.is_empty() {
                    tracing::warn!(?filters, "The dashboard has no facets; filters are ignored.");
                }
                ViewSnapshot::Dashboard(self.dashboard(data, limits))
            }
            ViewData::Agents(agents) => ViewSnapshot::Agents(self.agents(&filters.agents().apply(&agents))),
            ViewData::Portfolio(data) => ViewSnapshot::Portfolio(self.portfolio(data, filters)),
            ViewData::Positions(positions) => {
                ViewSnapshot::Positions(self.positions(filters.positions().apply(&positions)))
            }
            ViewData::Trades(trades) => ViewSnapshot::Trades(self.trades(filters.trades().apply(&trades))),
            ViewData::Strategies(strategies) => ViewSnapshot::Strategies(
                self.strategies(&filters.strategies().apply(&strategies), limits),
            ),
            ViewData::Reports(reports) => {
                ViewSnapshot::Reports(self.reports(&filters.reports().apply(&reports), limits))
            }
        }
    }

    pub fn dashboard(&self, data: DashboardData, limits: &SnapshotLimits) -> DashboardSnapshot {
        let top_positions = series::category(
            aggregate::top_n(&data.positions, limits.top_positions, |p| p.market_value.value()),
            |p: &Position| p.symbol.clone(),
            |p| p.market_value.value(),
        );

        let performance: [MetricFn<Strategy>; 2] = [
            ("return_pct", |s| aggregate::mul(s.total_return.value(), HUNDRED)),
            ("win_rate", |s| s.win_rate.value()),
        ];
        let strategy_performance = series::multi(
            aggregate::top_n(&data.strategies, limits.top_strategies, |s| s.score.value()),
            strategy_label,
            &performance,
        );

        let mut recent_trades = newest_trades_first(&data.trades);
        recent_trades.truncate(limits.recent_trades);

        DashboardSnapshot {
            portfolio: data.portfolios.first().map(|p| self.portfolio_summary(p)),
            agents: self.agent_stats(&data.agents),
            agent_rows: agents_in_layer_order(&data.agents),
            position_count: data.positions.len(),
            top_positions,
            strategy_performance,
            recent_trades,
            equity_trend: series::time_series(data.equity_history.as_deref()).into(),
        }
    }

    pub fn agents(&self, agents: &[AgentStatus]) -> AgentsSnapshot {
        let stats = self.agent_stats(agents);
        let status_distribution = series::bucket_counts(&stats.by_status, AgentState::ALL).non_zero();
        AgentsSnapshot {
            agents: agents_in_layer_order(agents),
            status_distribution,
            performance_history: series::time_series(None).into(),
            stats,
        }
    }

    pub fn portfolio(&self, data: PortfolioData, filters: &ViewFilters) -> PortfolioSnapshot {
        let portfolios = filters.portfolios().apply(&data.portfolios);
        let positions = filters.positions().apply(&data.positions);

        let distribution: [MetricFn<Position>; 2] = [
            ("market_value", |p| p.market_value.value()),
            ("unrealized_pnl", |p| p.unrealized_pnl.value()),
        ];
        let position_distribution =
            series::multi(&positions, |p: &Position| p.symbol.clone(), &distribution);

        let pnl_breakdown = self.pnl_breakdown(&positions);
        let pnl_distribution = CategorySeries::new(vec![
            SeriesPoint {
                label: "realized".to_string(),
                value: pnl_breakdown.realized,
            },
            SeriesPoint {
                label: "unrealized".to_string(),
                value: pnl_breakdown.unrealized,
            },
        ]);

        PortfolioSnapshot {
            summary: portfolios.first().map(|p| self.portfolio_summary(p)),
            positions: self.position_stats(&positions),
            position_distribution,
            pnl_breakdown,
            pnl_distribution,
            equity_trend: series::time_series(data.equity_history.as_deref()).into(),
        }
    }

    pub fn positions(&self, positions: Vec<Position>) -> PositionsSnapshot {
        let value_distribution = series::category(
            aggregate::rank_by(&positions, |p| p.market_value.value()),
            |p: &Position| p.symbol.clone(),
            |p| p.market_value.value(),
        );

        let pnl_metrics: [MetricFn<Position>; 2] = [
            ("pnl", |p| p.unrealized_pnl.value()),
            ("pnl_pct", |p| p.unrealized_pnl_pct.value()),
        ];
        let pnl_ranking = series::multi(
            aggregate::rank_by(&positions, |p| p.unrealized_pnl.value()),
            |p: &Position| p.symbol.clone(),
            &pnl_metrics,
        );

        PositionsSnapshot {
            stats: self.position_stats(&positions),
            value_distribution,
            pnl_ranking,
            positions,
        }
    }

    pub fn trades(&self, trades: Vec<Trade>) -> TradesSnapshot {
        let stats = self.trade_stats(&trades);
        TradesSnapshot {
            action_distribution: series::bucket_counts(&stats.by_action, TradeAction::ALL),
            status_distribution: series::bucket_counts(&stats.by_status, TradeStatus::ALL).non_zero(),
            stats,
            trades,
        }
    }

    pub fn strategies(&self, strategies: &[Strategy], limits: &SnapshotLimits) -> StrategiesSnapshot {
        let ranked = aggregate::rank_by(strategies, |s| s.score.value());

        let comparison_metrics: [MetricFn<Strategy>; 4] = [
            ("return_pct", |s| aggregate::mul(s.total_return.value(), HUNDRED)),
            ("win_rate", |s| s.win_rate.value()),
            ("sharpe", |s| s.sharpe_ratio.value()),
            ("score", |s| aggregate::mul(s.score.value(), Decimal::TEN)),
        ];
        let comparison = series::multi(
            ranked.iter().take(limits.compare_limit).copied(),
            strategy_label,
            &comparison_metrics,
        );

        let stats = self.strategy_stats(strategies);
        StrategiesSnapshot {
            status_distribution: series::bucket_counts(&stats.by_status, StrategyStatus::ALL).non_zero(),
            stats,
            comparison,
            top_profile: ranked.first().map(|s| series::strategy_profile(s)),
            strategies: ranked.into_iter().cloned().collect(),
        }
    }

    pub fn reports(&self, reports: &[ReviewReport], limits: &SnapshotLimits) -> ReportsSnapshot {
        let stats = self.review_stats(reports);
        let mut newest_first = reports.to_vec();
        newest_first.sort_by(|a, b| b.report_date.cmp(&a.report_date));

        ReportsSnapshot {
            trend: series::report_trend(reports, limits.trend_limit),
            type_distribution: series::bucket_counts(&stats.by_type, ReportType::ALL),
            stats,
            reports: newest_first,
        }
    }
}
