//! # Vantage Engine
//!
//! Drives periodic recomputation of dashboard views.
//!
//! The `RefreshScheduler` keeps one registration per view. Each cycle pulls the
//! view's raw collections through a `SnapshotSource`, hands them to the
//! stateless `analytics::AnalyticsEngine`, and publishes the resulting snapshot
//! atomically on a watch channel. A generation counter and a liveness flag
//! guard every publication, so results from torn-down views or superseded
//! filters are dropped rather than applied.

pub mod error;
pub mod scheduler;
pub mod source;
pub mod view;

pub use analytics::{Facet, ViewFilters, ViewSnapshot};
pub use error::EngineError;
pub use scheduler::{Published, RefreshScheduler, SnapshotReceiver, ViewStats};
pub use source::{ApiSnapshotSource, SnapshotSource};
pub use view::{snapshot_limits, ViewKind};
