use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// A time-bucketed chart was requested but nothing supplies historical data.
    #[error("No historical data source is configured for this series")]
    NoHistorySource,
}
