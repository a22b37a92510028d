use crate::aggregate::PnlCounts;
use core_types::{
    AccountType, AgentState, AgentType, ReportType, StrategyStatus, TradeAction, TradeStatus,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

// All percentages below are on a 0-100 scale and kept at full precision.
// Counts by enum bucket omit records whose enum value was missing or
// unrecognised; those records are still part of `total`.

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeStats {
    pub total: usize,
    pub buy: usize,
    pub sell: usize,
    pub filled: usize,
    pub by_action: BTreeMap<TradeAction, usize>,
    pub by_status: BTreeMap<TradeStatus, usize>,
    pub pnl: PnlCounts,
    pub win_rate: Decimal,
}

/// One position's slice of the total market value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionShare {
    pub symbol: String,
    pub market_value: Decimal,
    pub share: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionStats {
    pub total: usize,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_unrealized_pnl: Decimal,
    pub total_realized_pnl: Decimal,
    pub profitable: usize,
    pub losing: usize,
    /// Unrealised P&L as a percentage of cost.
    pub total_return: Decimal,
    /// In input order; sums to 100 whenever `total_value` is non-zero.
    pub shares: Vec<PositionShare>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrategyStats {
    pub total: usize,
    pub active: usize,
    pub by_status: BTreeMap<StrategyStatus, usize>,
    /// Mean of `total_return`, in the backend's fractional units.
    pub average_return: Decimal,
    pub average_win_rate: Decimal,
    /// Name and score of the highest-scoring strategy; the earliest wins a tie.
    pub top_strategy: Option<(String, Decimal)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentStats {
    pub total: usize,
    pub running: usize,
    pub errored: usize,
    pub by_status: BTreeMap<AgentState, usize>,
    pub by_type: BTreeMap<AgentType, usize>,
    /// Mean over the agents that report a success rate.
    pub average_success_rate: Decimal,
    pub tasks_completed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewStats {
    pub total: usize,
    pub by_type: BTreeMap<ReportType, usize>,
    pub trade_count: u64,
    pub win_count: u64,
    pub lose_count: u64,
    pub win_rate: Decimal,
}

/// The backend's account totals, parsed. These are never recomputed locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub account_name: String,
    pub account_type: Option<AccountType>,
    pub initial_capital: Decimal,
    pub total_asset: Decimal,
    pub cash: Decimal,
    pub market_value: Decimal,
    pub available_cash: Decimal,
    pub total_pnl: Decimal,
    pub total_return: Decimal,
    pub today_pnl: Decimal,
    pub today_return: Decimal,
    pub total_trades: u64,
    pub win_trades: u64,
    pub lose_trades: u64,
    pub win_rate: Decimal,
    pub max_drawdown: Decimal,
    pub sharpe_ratio: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PnlBreakdown {
    pub realized: Decimal,
    pub unrealized: Decimal,
    pub total: Decimal,
}
