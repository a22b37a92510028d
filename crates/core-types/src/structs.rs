use crate::enums::{
    deserialize_lenient, AccountType, AgentState, AgentType, ReportType, StrategyStatus,
    TradeAction, TradeStatus,
};
use crate::numeric::{deserialize_count, Numeric};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// All records are owned by the backend and are read-only here. Every field is
// defaulted so that a partially populated record still decodes; a missing value
// simply reads as zero, `None`, or empty.

/// An order placed by the execution layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trade {
    pub id: u64,
    pub trade_id: String,
    pub symbol: String,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub action: Option<TradeAction>,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub account_type: Option<AccountType>,
    pub account_name: String,
    pub order_price: Numeric,
    #[serde(deserialize_with = "deserialize_count")]
    pub order_quantity: u64,
    pub filled_price: Numeric,
    #[serde(deserialize_with = "deserialize_count")]
    pub filled_quantity: u64,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub status: Option<TradeStatus>,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub order_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub filled_time: Option<DateTime<Utc>>,
    pub commission: Numeric,
    pub total_amount: Numeric,
    /// Realised profit of the trade; null until the trade is closed out.
    pub pnl: Numeric,
    pub pnl_pct: Numeric,
}

/// A holding in one account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub id: u64,
    pub symbol: String,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub account_type: Option<AccountType>,
    pub account_name: String,
    #[serde(deserialize_with = "deserialize_count")]
    pub quantity: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub available_quantity: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub frozen_quantity: u64,
    pub avg_cost: Numeric,
    pub total_cost: Numeric,
    /// Null when no quote is available; `market_value` is null in the same cases.
    pub current_price: Numeric,
    pub market_value: Numeric,
    pub unrealized_pnl: Numeric,
    pub unrealized_pnl_pct: Numeric,
    pub realized_pnl: Numeric,
    #[serde(deserialize_with = "deserialize_count")]
    pub holding_days: u64,
    pub is_closed: bool,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub opened_at: Option<DateTime<Utc>>,
}

/// A strategy produced by the planning layer, with its running scorecard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Strategy {
    pub id: u64,
    pub name: String,
    pub strategy_type: String,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub status: Option<StrategyStatus>,
    /// Percentage, 0-100.
    pub win_rate: Numeric,
    pub profit_loss_ratio: Numeric,
    pub sharpe_ratio: Numeric,
    /// Fraction, e.g. 0.12 for 12%.
    pub max_drawdown: Numeric,
    /// Fraction, e.g. 0.05 for 5%.
    pub total_return: Numeric,
    #[serde(deserialize_with = "deserialize_count")]
    pub usage_count: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub success_count: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub fail_count: u64,
    pub score: Numeric,
}

/// Account-level totals. These are authoritative on the backend and treated as opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    pub id: u64,
    pub account_name: String,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub account_type: Option<AccountType>,
    pub initial_capital: Numeric,
    pub total_asset: Numeric,
    pub cash: Numeric,
    pub market_value: Numeric,
    pub available_cash: Numeric,
    pub total_pnl: Numeric,
    pub total_return: Numeric,
    pub today_pnl: Numeric,
    pub today_return: Numeric,
    #[serde(deserialize_with = "deserialize_count")]
    pub total_trades: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub win_trades: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub lose_trades: u64,
    pub win_rate: Numeric,
    pub max_drawdown: Numeric,
    pub sharpe_ratio: Numeric,
}

/// A periodic review written by the reflection layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewReport {
    pub id: u64,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub report_type: Option<ReportType>,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub report_date: Option<NaiveDate>,
    pub title: String,
    pub total_return: Numeric,
    pub win_rate: Numeric,
    pub sharpe_ratio: Numeric,
    pub max_drawdown: Numeric,
    #[serde(deserialize_with = "deserialize_count")]
    pub trade_count: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub win_count: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub lose_count: u64,
    pub success_cases: Vec<Value>,
    pub failure_cases: Vec<Value>,
    pub lessons_learned: Vec<Value>,
    pub improvement_suggestions: Vec<String>,
}

/// Self-reported health counters of an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentMetrics {
    #[serde(deserialize_with = "deserialize_count")]
    pub tasks_completed: u64,
    /// Percentage, 0-100, when reported.
    pub success_rate: Numeric,
    /// Milliseconds.
    pub avg_response_time: Numeric,
    pub uptime_hours: Numeric,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentStatus {
    pub id: u64,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub agent_type: Option<AgentType>,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub status: Option<AgentState>,
    pub current_task: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub metrics: AgentMetrics,
    #[serde(deserialize_with = "deserialize_count")]
    pub error_count: u64,
    pub last_error: Option<String>,
}

/// One bucket of an externally supplied time series, e.g. daily account equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Numeric,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn trade_decodes_from_backend_shape() {
        let trade: Trade = serde_json::from_value(json!({
            "id": 7,
            "trade_id": "T-0007",
            "symbol": "600519",
            "action": "SELL",
            "account_type": "simulation",
            "order_price": "1710.50",
            "order_quantity": 100,
            "filled_price": null,
            "status": "partial_filled",
            "order_time": "2024-11-22T09:31:00+08:00",
            "pnl": "-12.40",
            "commission": "5"
        }))
        .unwrap();

        assert_eq!(trade.action, Some(TradeAction::Sell));
        assert_eq!(trade.status, Some(TradeStatus::PartialFilled));
        assert_eq!(trade.pnl.value(), dec!(-12.40));
        assert_eq!(trade.filled_price.get(), None);
        assert_eq!(trade.order_time.unwrap().to_rfc3339(), "2024-11-22T01:31:00+00:00");
        assert_eq!(trade.filled_quantity, 0);
    }

    #[test]
    fn unknown_enum_values_do_not_reject_the_record() {
        let agent: AgentStatus = serde_json::from_value(json!({
            "agent_type": "oracle",
            "status": "running",
            "metrics": {"success_rate": 97.5}
        }))
        .unwrap();
        assert_eq!(agent.agent_type, None);
        assert_eq!(agent.status, Some(AgentState::Running));
        assert_eq!(agent.metrics.success_rate.value(), dec!(97.5));
    }

    #[test]
    fn report_date_is_a_plain_date() {
        let report: ReviewReport = serde_json::from_value(json!({
            "report_type": "weekly",
            "report_date": "2024-11-18",
            "win_count": 3,
            "lose_count": 1
        }))
        .unwrap();
        assert_eq!(report.report_date, NaiveDate::from_ymd_opt(2024, 11, 18));
        assert_eq!(report.report_type, Some(ReportType::Weekly));
    }
}
