//! # Vantage Core Types
//!
//! Layer 0 of the workspace: the read-only records served by the trading backend,
//! the closed enumerations they carry, and the single text/numeric boundary that
//! every other crate uses to read business numbers.

pub mod enums;
pub mod error;
pub mod numeric;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{
    deserialize_lenient, parse_enum, AccountType, AgentState, AgentType, ReportType, StrategyStatus,
    TradeAction, TradeStatus,
};
pub use error::CoreError;
pub use numeric::{format_decimal, parse_decimal, Numeric};
pub use structs::{
    AgentMetrics, AgentStatus, HistoryPoint, Portfolio, Position, ReviewReport, Strategy, Trade,
};
