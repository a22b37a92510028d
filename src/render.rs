use analytics::aggregate::{self, HUNDRED};
use analytics::{AgentRow, CategorySeries, MultiSeries, PortfolioSummary, Trend, ViewSnapshot};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use core_types::{format_decimal, Position, ReviewReport, Strategy, Trade};
use engine::Published;
use rust_decimal::Decimal;
use std::fmt::Display;

// ==============================================================================
// Formatting Helpers
// ==============================================================================

fn num(value: Decimal) -> String {
    format_decimal(value, 2)
}

fn pct(value: Decimal) -> String {
    format!("{}%", format_decimal(value, 2))
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(Cell::new));
    table
}

/// A two-column key/value table.
fn facts(title: &str, rows: Vec<(&str, String)>) -> String {
    let mut table = table(&[title, ""]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table.to_string()
}

fn category(title: &str, series: &CategorySeries) -> String {
    let mut table = table(&[title, "Value"]);
    for point in &series.points {
        table.add_row(vec![Cell::new(&point.label), Cell::new(num(point.value))]);
    }
    table.to_string()
}

fn multi(title: &str, series: &MultiSeries) -> String {
    let mut header = vec![title];
    header.extend(series.metrics.iter().map(|m| m.name.as_str()));
    let mut table = table(&header);
    for (i, label) in series.categories.iter().enumerate() {
        let mut row = vec![Cell::new(label)];
        row.extend(series.metrics.iter().map(|m| Cell::new(num(m.values[i]))));
        table.add_row(row);
    }
    table.to_string()
}

fn trend(title: &str, trend: &Trend) -> String {
    match trend {
        Trend::Available(series) => {
            let mut table = table(&[title, "Value"]);
            for point in &series.points {
                table.add_row(vec![
                    Cell::new(point.timestamp.format("%Y-%m-%d %H:%M")),
                    Cell::new(num(point.value)),
                ]);
            }
            table.to_string()
        }
        Trend::Unavailable { reason } => format!("{title}: unavailable ({reason})"),
    }
}

// ==============================================================================
// Record Tables
// ==============================================================================

fn summary(summary: Option<&PortfolioSummary>) -> String {
    let Some(s) = summary else {
        return "Portfolio: no account matched.".to_string();
    };
    facts(
        "Portfolio",
        vec![
            ("Account", format!("{} ({})", s.account_name, opt(s.account_type))),
            ("Total asset", num(s.total_asset)),
            ("Cash", num(s.cash)),
            ("Market value", num(s.market_value)),
            ("Total P&L", num(s.total_pnl)),
            ("Total return", pct(s.total_return)),
            ("Today P&L", num(s.today_pnl)),
            ("Win rate", pct(s.win_rate)),
            ("Max drawdown", pct(s.max_drawdown)),
            ("Sharpe", num(s.sharpe_ratio)),
        ],
    )
}

fn agent_table(rows: &[AgentRow]) -> String {
    let mut table = table(&["Agent", "Status", "Task", "Success", "Resp (ms)", "Done", "Errors"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(opt(row.agent_type)),
            Cell::new(opt(row.status)),
            Cell::new(row.current_task.as_deref().unwrap_or("-")),
            Cell::new(opt(row.success_rate.map(pct))),
            Cell::new(num(row.avg_response_time)),
            Cell::new(row.tasks_completed),
            Cell::new(row.error_count),
        ]);
    }
    table.to_string()
}

fn trade_table(trades: &[Trade]) -> String {
    let mut table = table(&["Time", "Symbol", "Action", "Qty", "Price", "Status", "P&L"]);
    for t in trades {
        table.add_row(vec![
            Cell::new(opt(t.order_time.map(|ts| ts.format("%Y-%m-%d %H:%M")))),
            Cell::new(&t.symbol),
            Cell::new(opt(t.action)),
            Cell::new(t.order_quantity),
            Cell::new(&t.order_price),
            Cell::new(opt(t.status)),
            Cell::new(&t.pnl),
        ]);
    }
    table.to_string()
}

fn position_table(positions: &[Position]) -> String {
    let mut table = table(&["Symbol", "Account", "Qty", "Cost", "Price", "Value", "Unrealised", "%"]);
    for p in positions {
        table.add_row(vec![
            Cell::new(&p.symbol),
            Cell::new(opt(p.account_type)),
            Cell::new(p.quantity),
            Cell::new(&p.avg_cost),
            Cell::new(&p.current_price),
            Cell::new(&p.market_value),
            Cell::new(&p.unrealized_pnl),
            Cell::new(&p.unrealized_pnl_pct),
        ]);
    }
    table.to_string()
}

fn strategy_table(strategies: &[Strategy]) -> String {
    let mut table = table(&["Name", "Type", "Status", "Return", "Win rate", "Sharpe", "Score"]);
    for s in strategies {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(&s.strategy_type),
            Cell::new(opt(s.status)),
            Cell::new(pct(aggregate::mul(s.total_return.value(), HUNDRED))),
            Cell::new(pct(s.win_rate.value())),
            Cell::new(&s.sharpe_ratio),
            Cell::new(&s.score),
        ]);
    }
    table.to_string()
}

fn report_table(reports: &[ReviewReport]) -> String {
    let mut table = table(&["Date", "Type", "Title", "Return", "Trades", "Won", "Lost"]);
    for r in reports {
        table.add_row(vec![
            Cell::new(opt(r.report_date)),
            Cell::new(opt(r.report_type)),
            Cell::new(&r.title),
            Cell::new(&r.total_return),
            Cell::new(r.trade_count),
            Cell::new(r.win_count),
            Cell::new(r.lose_count),
        ]);
    }
    table.to_string()
}

// ==============================================================================
// Views
// ==============================================================================

/// Renders a snapshot as a sequence of terminal tables.
pub fn render(snapshot: &ViewSnapshot) -> String {
    let sections = match snapshot {
        ViewSnapshot::Dashboard(s) => vec![
            summary(s.portfolio.as_ref()),
            facts(
                "Agents",
                vec![
                    ("Running", format!("{}/{}", s.agents.running, s.agents.total)),
                    ("Errored", s.agents.errored.to_string()),
                    ("Avg success", pct(s.agents.average_success_rate)),
                    ("Open positions", s.position_count.to_string()),
                ],
            ),
            category("Top positions", &s.top_positions),
            multi("Strategy", &s.strategy_performance),
            trade_table(&s.recent_trades),
            trend("Equity", &s.equity_trend),
        ],
        ViewSnapshot::Agents(s) => vec![
            facts(
                "Agents",
                vec![
                    ("Total", s.stats.total.to_string()),
                    ("Running", s.stats.running.to_string()),
                    ("Errored", s.stats.errored.to_string()),
                    ("Avg success", pct(s.stats.average_success_rate)),
                    ("Tasks completed", s.stats.tasks_completed.to_string()),
                ],
            ),
            agent_table(&s.agents),
            category("Status", &s.status_distribution),
            trend("Performance", &s.performance_history),
        ],
        ViewSnapshot::Portfolio(s) => vec![
            summary(s.summary.as_ref()),
            facts(
                "P&L",
                vec![
                    ("Realised", num(s.pnl_breakdown.realized)),
                    ("Unrealised", num(s.pnl_breakdown.unrealized)),
                    ("Total", num(s.pnl_breakdown.total)),
                    ("Return on cost", pct(s.positions.total_return)),
                ],
            ),
            multi("Position", &s.position_distribution),
            trend("Equity", &s.equity_trend),
        ],
        ViewSnapshot::Positions(s) => vec![
            facts(
                "Positions",
                vec![
                    ("Open", s.stats.total.to_string()),
                    ("Market value", num(s.stats.total_value)),
                    ("Unrealised P&L", num(s.stats.total_unrealized_pnl)),
                    ("Profitable / losing", format!("{} / {}", s.stats.profitable, s.stats.losing)),
                ],
            ),
            category("Allocation", &s.value_distribution),
            position_table(&s.positions),
        ],
        ViewSnapshot::Trades(s) => vec![
            facts(
                "Trades",
                vec![
                    ("Total", s.stats.total.to_string()),
                    ("Buy / sell", format!("{} / {}", s.stats.buy, s.stats.sell)),
                    ("Filled", s.stats.filled.to_string()),
                    ("Win rate", pct(s.stats.win_rate)),
                    ("Total P&L", num(s.stats.pnl.total_pnl)),
                ],
            ),
            category("Status", &s.status_distribution),
            trade_table(&s.trades),
        ],
        ViewSnapshot::Strategies(s) => {
            let top = s
                .stats
                .top_strategy
                .as_ref()
                .map(|(name, score)| format!("{name} ({})", num(*score)));
            let mut sections = vec![
                facts(
                    "Strategies",
                    vec![
                        ("Total", s.stats.total.to_string()),
                        ("Active", s.stats.active.to_string()),
                        ("Avg return", pct(aggregate::mul(s.stats.average_return, HUNDRED))),
                        ("Avg win rate", pct(s.stats.average_win_rate)),
                        ("Top", opt(top)),
                    ],
                ),
                multi("Strategy", &s.comparison),
                strategy_table(&s.strategies),
            ];
            if let Some(profile) = &s.top_profile {
                sections.push(category("Top strategy profile", profile));
            }
            sections
        }
        ViewSnapshot::Reports(s) => vec![
            facts(
                "Reviews",
                vec![
                    ("Reports", s.stats.total.to_string()),
                    ("Trades", s.stats.trade_count.to_string()),
                    ("Won / lost", format!("{} / {}", s.stats.win_count, s.stats.lose_count)),
                    ("Win rate", pct(s.stats.win_rate)),
                ],
            ),
            multi("Date", &s.trend),
            report_table(&s.reports),
        ],
    };
    sections.join("\n")
}

/// Heading line for one published snapshot.
pub fn heading(published: &Published) -> String {
    format!(
        "== {} (cycle {}, {}) ==",
        published.view,
        published.cycle,
        published.fetched_at.format("%H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::{AnalyticsEngine, SnapshotLimits, ViewData, ViewFilters};
    use core_types::{Numeric, TradeAction};

    #[test]
    fn trades_view_lists_each_trade() {
        let trades = vec![
            Trade {
                symbol: "600519".to_string(),
                action: Some(TradeAction::Buy),
                pnl: Numeric::from("12.5"),
                ..Default::default()
            },
            Trade {
                symbol: "000001".to_string(),
                action: Some(TradeAction::Sell),
                ..Default::default()
            },
        ];
        let snapshot = AnalyticsEngine::new().build(
            ViewData::Trades(trades),
            &ViewFilters::default(),
            &SnapshotLimits::default(),
        );

        let text = render(&snapshot);
        assert!(text.contains("600519"));
        assert!(text.contains("000001"));
        assert!(text.contains("1 / 1"));
    }

    #[test]
    fn missing_history_is_reported_not_hidden() {
        let text = trend("Equity", &Trend::Unavailable { reason: "no source".to_string() });
        assert_eq!(text, "Equity: unavailable (no source)");
    }

    #[test]
    fn out_of_range_returns_render_without_panicking() {
        let strategy = Strategy {
            name: "huge".to_string(),
            total_return: Numeric::from("79228162514264337593543950335"),
            ..Default::default()
        };
        let snapshot = AnalyticsEngine::new().build(
            ViewData::Strategies(vec![strategy]),
            &ViewFilters::default(),
            &SnapshotLimits::default(),
        );
        let text = render(&snapshot);
        assert!(text.contains("huge"));
        assert!(text.contains("0.00%"));
    }

    #[test]
    fn percentages_use_two_places() {
        assert_eq!(pct(Decimal::new(12345, 3)), "12.35%");
        assert_eq!(opt::<u8>(None), "-");
    }
}
