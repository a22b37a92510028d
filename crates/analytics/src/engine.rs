use crate::aggregate::{self, PnlCounts};
use crate::stats::{
    AgentStats, PnlBreakdown, PortfolioSummary, PositionShare, PositionStats, ReviewStats,
    StrategyStats, TradeStats,
};
use core_types::{
    AgentState, AgentStatus, Portfolio, Position, ReviewReport, Strategy, StrategyStatus, Trade,
    TradeAction, TradeStatus,
};
use rust_decimal::Decimal;

/// A stateless calculator for deriving statistics from backend records.
///
/// Every method is a pure function of its input: no I/O, no retained state, and
/// no failure mode. Records are expected to be filtered already.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trade_stats(&self, trades: &[Trade]) -> TradeStats {
        let by_action = aggregate::count_by(trades, |t| t.action);
        let by_status = aggregate::count_by(trades, |t| t.status);
        let pnl = PnlCounts::classify(trades, |t| t.pnl.value());

        TradeStats {
            total: trades.len(),
            buy: by_action.get(&TradeAction::Buy).copied().unwrap_or(0),
            sell: by_action.get(&TradeAction::Sell).copied().unwrap_or(0),
            filled: by_status.get(&TradeStatus::Filled).copied().unwrap_or(0),
            by_action,
            by_status,
            win_rate: pnl.win_rate(),
            pnl,
        }
    }

    pub fn position_stats(&self, positions: &[Position]) -> PositionStats {
        let values: Vec<Decimal> = positions.iter().map(|p| p.market_value.value()).collect();
        let total_value = aggregate::total(values.iter().copied());
        let total_cost = aggregate::sum_by(positions, |p| p.total_cost.value());
        let unrealized = PnlCounts::classify(positions, |p| p.unrealized_pnl.value());

        let shares = positions
            .iter()
            .zip(aggregate::shares(&values))
            .zip(&values)
            .map(|((p, share), value)| PositionShare {
                symbol: p.symbol.clone(),
                market_value: *value,
                share,
            })
            .collect();

        PositionStats {
            total: positions.len(),
            total_value,
            total_cost,
            total_unrealized_pnl: unrealized.total_pnl,
            total_realized_pnl: aggregate::sum_by(positions, |p| p.realized_pnl.value()),
            profitable: unrealized.profitable,
            losing: unrealized.losing,
            total_return: aggregate::percent_of(unrealized.total_pnl, total_cost),
            shares,
        }
    }

    pub fn strategy_stats(&self, strategies: &[Strategy]) -> StrategyStats {
        let by_status = aggregate::count_by(strategies, |s| s.status);
        let top_strategy = aggregate::top_n(strategies, 1, |s| s.score.value())
            .first()
            .map(|s| (s.name.clone(), s.score.value()));

        StrategyStats {
            total: strategies.len(),
            active: by_status.get(&StrategyStatus::Active).copied().unwrap_or(0),
            by_status,
            average_return: aggregate::average(strategies.iter().map(|s| s.total_return.value())),
            average_win_rate: aggregate::average(strategies.iter().map(|s| s.win_rate.value())),
            top_strategy,
        }
    }

    pub fn agent_stats(&self, agents: &[AgentStatus]) -> AgentStats {
        let by_status = aggregate::count_by(agents, |a| a.status);
        let by_type = aggregate::count_by(agents, |a| a.agent_type);
        let reported = agents
            .iter()
            .filter_map(|a| a.metrics.success_rate.get())
            .map(|rate| rate.clamp(Decimal::ZERO, aggregate::HUNDRED));

        AgentStats {
            total: agents.len(),
            running: by_status.get(&AgentState::Running).copied().unwrap_or(0),
            errored: by_status.get(&AgentState::Error).copied().unwrap_or(0),
            by_status,
            by_type,
            average_success_rate: aggregate::average(reported),
            tasks_completed: aggregate::total_count(agents.iter().map(|a| a.metrics.tasks_completed)),
        }
    }

    pub fn review_stats(&self, reports: &[ReviewReport]) -> ReviewStats {
        let win_count = aggregate::total_count(reports.iter().map(|r| r.win_count));
        let lose_count = aggregate::total_count(reports.iter().map(|r| r.lose_count));

        ReviewStats {
            total: reports.len(),
            by_type: aggregate::count_by(reports, |r| r.report_type),
            trade_count: aggregate::total_count(reports.iter().map(|r| r.trade_count)),
            win_count,
            lose_count,
            win_rate: aggregate::win_rate(win_count, lose_count),
        }
    }

    pub fn portfolio_summary(&self, portfolio: &Portfolio) -> PortfolioSummary {
        PortfolioSummary {
            account_name: portfolio.account_name.clone(),
            account_type: portfolio.account_type,
            initial_capital: portfolio.initial_capital.value(),
            total_asset: portfolio.total_asset.value(),
            cash: portfolio.cash.value(),
            market_value: portfolio.market_value.value(),
            available_cash: portfolio.available_cash.value(),
            total_pnl: portfolio.total_pnl.value(),
            total_return: portfolio.total_return.value(),
            today_pnl: portfolio.today_pnl.value(),
            today_return: portfolio.today_return.value(),
            total_trades: portfolio.total_trades,
            win_trades: portfolio.win_trades,
            lose_trades: portfolio.lose_trades,
            win_rate: portfolio.win_rate.value(),
            max_drawdown: portfolio.max_drawdown.value(),
            sharpe_ratio: portfolio.sharpe_ratio.value(),
        }
    }

    /// Realised versus unrealised P&L, summed over the positions.
    pub fn pnl_breakdown(&self, positions: &[Position]) -> PnlBreakdown {
        let realized = aggregate::sum_by(positions, |p| p.realized_pnl.value());
        let unrealized = aggregate::sum_by(positions, |p| p.unrealized_pnl.value());
        PnlBreakdown {
            realized,
            unrealized,
            total: aggregate::add(realized, unrealized),
        }
    }
}
