//! # Vantage Analytics
//!
//! Turns raw, independently fetched backend collections into consistent derived
//! statistics, rankings and chart-ready series.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** A pure logic crate with no knowledge of HTTP or timers.
//!   It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** `AnalyticsEngine` holds no state. Each refresh
//!   cycle hands it fresh records and gets a fresh snapshot back.
//! - **Total Functions:** No aggregation can fail. Empty input, zero
//!   denominators, malformed numbers and results outside `Decimal`'s range
//!   all resolve to zero. The one
//!   exception is a time series with no history source behind it, which is
//!   reported as `AnalyticsError::NoHistorySource`.
//!
//! ## Public API
//!
//! - `aggregate`: counting, summing, ratio, share and ranking primitives.
//! - `FilterState` / `ViewFilters`: facet composition.
//! - `AnalyticsEngine`: per-entity statistics and per-view snapshot assembly.
//! - `series`: category, multi-metric and time-ordered chart series.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod filter;
pub mod series;
pub mod snapshot;
pub mod stats;

pub use aggregate::PnlCounts;
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use filter::{Facet, FilterState, Filterable, ViewFilters};
pub use series::{CategorySeries, MultiSeries, SeriesPoint, TimeSeries, Trend};
pub use snapshot::{
    AgentRow, AgentsSnapshot, DashboardData, DashboardSnapshot, PortfolioData, PortfolioSnapshot,
    PositionsSnapshot, ReportsSnapshot, SnapshotLimits, StrategiesSnapshot, TradesSnapshot,
    ViewData, ViewSnapshot,
};
pub use stats::{
    AgentStats, PnlBreakdown, PortfolioSummary, PositionShare, PositionStats, ReviewStats,
    StrategyStats, TradeStats,
};
