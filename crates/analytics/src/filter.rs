//! Facet filtering.
//!
//! A [`FilterState`] holds one value per facet. Every facet defaults to
//! accepting everything, and the active facets combine with logical AND through
//! [`FilterState::compose`]. Filtering always starts again from the full raw
//! collection; filtered output is never filtered a second time.

use core_types::{
    parse_enum, AccountType, AgentState, AgentStatus, Portfolio, Position, ReportType,
    ReviewReport, Strategy, StrategyStatus, Trade, TradeAction, TradeStatus,
};
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The text that selects "accept all" for an enum facet.
pub const ALL: &str = "all";

/// One enum filter dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Facet<T> {
    All,
    Only(T),
    /// A value outside the closed set. Matches nothing.
    Unrecognized(String),
}

impl<T> Default for Facet<T> {
    fn default() -> Self {
        Facet::All
    }
}

impl<T: FromStr> Facet<T> {
    /// Parses user input; blank or `"all"` selects everything.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case(ALL) {
            return Facet::All;
        }
        match parse_enum::<T>(text) {
            Some(value) => Facet::Only(value),
            None => {
                tracing::debug!(value = text, "Unrecognised facet value; it will match nothing.");
                Facet::Unrecognized(text.to_string())
            }
        }
    }
}

impl<T> Facet<T> {
    pub fn is_active(&self) -> bool {
        !matches!(self, Facet::All)
    }

    /// The selected value, when it is a recognised one.
    pub fn selected(&self) -> Option<&T> {
        match self {
            Facet::Only(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: PartialEq> Facet<T> {
    /// A record without a value for this dimension only passes an inactive facet.
    pub fn accepts(&self, value: Option<&T>) -> bool {
        match self {
            Facet::All => true,
            Facet::Only(wanted) => value == Some(wanted),
            Facet::Unrecognized(_) => false,
        }
    }
}

impl<T: FromStr> FromStr for Facet<T> {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Facet::parse(s))
    }
}

impl<T: fmt::Display> fmt::Display for Facet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facet::All => f.write_str(ALL),
            Facet::Only(value) => value.fmt(f),
            Facet::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// The dimensions a record exposes to filtering.
pub trait Filterable {
    /// The record's status enumeration; `Infallible` for records without one.
    type Status: PartialEq;

    fn symbol(&self) -> Option<&str> {
        None
    }

    fn action(&self) -> Option<TradeAction> {
        None
    }

    fn status(&self) -> Option<Self::Status> {
        None
    }

    fn account_type(&self) -> Option<AccountType> {
        None
    }
}

impl Filterable for Trade {
    type Status = TradeStatus;

    fn symbol(&self) -> Option<&str> {
        Some(&self.symbol)
    }

    fn action(&self) -> Option<TradeAction> {
        self.action
    }

    fn status(&self) -> Option<TradeStatus> {
        self.status
    }

    fn account_type(&self) -> Option<AccountType> {
        self.account_type
    }
}

impl Filterable for Position {
    type Status = Infallible;

    fn symbol(&self) -> Option<&str> {
        Some(&self.symbol)
    }

    fn account_type(&self) -> Option<AccountType> {
        self.account_type
    }
}

impl Filterable for Portfolio {
    type Status = Infallible;

    fn account_type(&self) -> Option<AccountType> {
        self.account_type
    }
}

impl Filterable for Strategy {
    type Status = StrategyStatus;

    fn status(&self) -> Option<StrategyStatus> {
        self.status
    }
}

impl Filterable for AgentStatus {
    type Status = AgentState;

    fn status(&self) -> Option<AgentState> {
        self.status
    }
}

impl Filterable for ReviewReport {
    type Status = ReportType;

    fn status(&self) -> Option<ReportType> {
        self.report_type
    }
}

/// The active predicates for one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState<S> {
    /// Case-insensitive substring; blank accepts everything.
    pub symbol: String,
    pub action: Facet<TradeAction>,
    pub status: Facet<S>,
    pub account_type: Facet<AccountType>,
}

impl<S> Default for FilterState<S> {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            action: Facet::All,
            status: Facet::All,
            account_type: Facet::All,
        }
    }
}

impl<S: PartialEq> FilterState<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn with_action(mut self, action: Facet<TradeAction>) -> Self {
        self.action = action;
        self
    }

    pub fn with_status(mut self, status: Facet<S>) -> Self {
        self.status = status;
        self
    }

    pub fn with_account_type(mut self, account_type: Facet<AccountType>) -> Self {
        self.account_type = account_type;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.symbol.trim().is_empty()
            && !self.action.is_active()
            && !self.status.is_active()
            && !self.account_type.is_active()
    }

    /// Folds every active facet into one acceptance test.
    pub fn compose<R>(&self) -> impl Fn(&R) -> bool + '_
    where
        R: Filterable<Status = S>,
    {
        let needle = self.symbol.trim().to_lowercase();
        move |record: &R| {
            let symbol_ok = needle.is_empty()
                || record
                    .symbol()
                    .is_some_and(|s| s.to_lowercase().contains(&needle));
            symbol_ok
                && self.action.accepts(record.action().as_ref())
                && self.status.accepts(record.status().as_ref())
                && self.account_type.accepts(record.account_type().as_ref())
        }
    }

    pub fn matches<R>(&self, record: &R) -> bool
    where
        R: Filterable<Status = S>,
    {
        self.compose()(record)
    }

    /// The accepted records, cloned, in input order.
    pub fn apply<R>(&self, records: &[R]) -> Vec<R>
    where
        R: Filterable<Status = S> + Clone,
    {
        if self.is_empty() {
            return records.to_vec();
        }
        let accept = self.compose();
        records.iter().filter(|r| accept(*r)).cloned().collect()
    }
}

/// Every facet a view may set, gathered in one value.
///
/// Each view reads only the facets relevant to its records; the rest stay at
/// "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewFilters {
    pub symbol: String,
    pub action: Facet<TradeAction>,
    pub trade_status: Facet<TradeStatus>,
    pub account_type: Facet<AccountType>,
    pub strategy_status: Facet<StrategyStatus>,
    pub agent_state: Facet<AgentState>,
    pub report_type: Facet<ReportType>,
}

impl ViewFilters {
    pub fn trades(&self) -> FilterState<TradeStatus> {
        FilterState::new()
            .with_symbol(self.symbol.clone())
            .with_action(self.action.clone())
            .with_status(self.trade_status.clone())
            .with_account_type(self.account_type.clone())
    }

    pub fn positions(&self) -> FilterState<Infallible> {
        FilterState::new()
            .with_symbol(self.symbol.clone())
            .with_account_type(self.account_type.clone())
    }

    pub fn portfolios(&self) -> FilterState<Infallible> {
        FilterState::new().with_account_type(self.account_type.clone())
    }

    pub fn strategies(&self) -> FilterState<StrategyStatus> {
        FilterState::new().with_status(self.strategy_status.clone())
    }

    pub fn agents(&self) -> FilterState<AgentState> {
        FilterState::new().with_status(self.agent_state.clone())
    }

    pub fn reports(&self) -> FilterState<ReportType> {
        FilterState::new().with_status(self.report_type.clone())
    }

    /// True when no facet is active and the symbol query is blank.
    pub fn is_empty(&self) -> bool {
        self.symbol.trim().is_empty()
            && !self.action.is_active()
            && !self.trade_status.is_active()
            && !self.account_type.is_active()
            && !self.strategy_status.is_active()
            && !self.agent_state.is_active()
            && !self.report_type.is_active()
    }
}
