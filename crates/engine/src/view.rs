use crate::error::EngineError;
use analytics::SnapshotLimits;
use configuration::{Config, RefreshConfig};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The identity a view is registered under in the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewKind {
    Dashboard,
    Agents,
    Portfolio,
    Positions,
    Trades,
    Strategies,
    Reports,
}

impl ViewKind {
    pub const ALL: [ViewKind; 7] = [
        ViewKind::Dashboard,
        ViewKind::Agents,
        ViewKind::Portfolio,
        ViewKind::Positions,
        ViewKind::Trades,
        ViewKind::Strategies,
        ViewKind::Reports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Dashboard => "dashboard",
            ViewKind::Agents => "agents",
            ViewKind::Portfolio => "portfolio",
            ViewKind::Positions => "positions",
            ViewKind::Trades => "trades",
            ViewKind::Strategies => "strategies",
            ViewKind::Reports => "reports",
        }
    }

    /// The polling interval, or `None` for views that refresh only on demand.
    pub fn interval(&self, refresh: &RefreshConfig) -> Option<Duration> {
        let secs = match self {
            ViewKind::Dashboard => refresh.dashboard_secs,
            ViewKind::Agents => refresh.agents_secs,
            ViewKind::Portfolio => refresh.portfolio_secs,
            ViewKind::Positions => refresh.positions_secs,
            ViewKind::Trades => refresh.trades_secs,
            ViewKind::Strategies => refresh.strategies_secs,
            ViewKind::Reports => refresh.reports_secs,
        };
        secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ViewKind::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| EngineError::UnknownView(s.to_string()))
    }
}

/// Maps the list and chart sizes from the configuration.
pub fn snapshot_limits(config: &Config) -> SnapshotLimits {
    SnapshotLimits {
        recent_trades: config.dashboard.recent_trades,
        top_positions: config.dashboard.top_positions,
        top_strategies: config.dashboard.top_strategies,
        compare_limit: config.strategies.compare_limit,
        trend_limit: config.reports.trend_limit,
    }
}
