use crate::error::EngineError;
use crate::source::SnapshotSource;
use crate::view::{snapshot_limits, ViewKind};
use analytics::{AnalyticsEngine, SnapshotLimits, ViewFilters, ViewSnapshot};
use chrono::{DateTime, Utc};
use configuration::{Config, RefreshConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// One snapshot as handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct Published {
    pub view: ViewKind,
    /// Monotonic per registration; a later cycle always has a larger number.
    pub cycle: u64,
    /// The filter generation the snapshot was computed under.
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    pub snapshot: ViewSnapshot,
}

/// Observes the latest published snapshot of one view. `None` until the first
/// cycle succeeds.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<Published>>>;

/// Counters for one registered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewStats {
    pub generation: u64,
    pub started_cycles: u64,
    pub published_cycles: u64,
    pub failed_cycles: u64,
    pub skipped_ticks: u64,
}

/// Everything a cycle needs besides the view itself.
struct CycleRunner {
    source: Arc<dyn SnapshotSource>,
    engine: AnalyticsEngine,
    limits: SnapshotLimits,
    timeout: Duration,
}

/// State checked before any result is applied.
struct Liveness {
    alive: bool,
    generation: u64,
    filters: ViewFilters,
    published_cycle: u64,
}

/// Releases the in-flight slot when a cycle ends, including by panic.
struct InFlight<'a> {
    slot: &'a AtomicU64,
    marker: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        // A newer generation may already own the slot.
        let _ = self.slot.compare_exchange(self.marker, 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}

struct ViewShared {
    view: ViewKind,
    liveness: Mutex<Liveness>,
    trigger: Notify,
    cancel: CancellationToken,
    publisher: watch::Sender<Option<Arc<Published>>>,
    /// `generation + 1` of the cycle in flight, or 0 when idle.
    in_flight: AtomicU64,
    next_cycle: AtomicU64,
    published_cycles: AtomicU64,
    failed_cycles: AtomicU64,
    skipped_ticks: AtomicU64,
}

impl ViewShared {
    fn new(view: ViewKind, filters: ViewFilters, publisher: watch::Sender<Option<Arc<Published>>>) -> Self {
        Self {
            view,
            liveness: Mutex::new(Liveness {
                alive: true,
                generation: 0,
                filters,
                published_cycle: 0,
            }),
            trigger: Notify::new(),
            cancel: CancellationToken::new(),
            publisher,
            in_flight: AtomicU64::new(0),
            next_cycle: AtomicU64::new(0),
            published_cycles: AtomicU64::new(0),
            failed_cycles: AtomicU64::new(0),
            skipped_ticks: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Liveness> {
        self.liveness.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stats(&self) -> ViewStats {
        ViewStats {
            generation: self.lock().generation,
            started_cycles: self.next_cycle.load(Ordering::SeqCst),
            published_cycles: self.published_cycles.load(Ordering::SeqCst),
            failed_cycles: self.failed_cycles.load(Ordering::SeqCst),
            skipped_ticks: self.skipped_ticks.load(Ordering::SeqCst),
        }
    }

    /// Starts a cycle unless one of the current generation is still running.
    ///
    /// Only the view's timer task calls this, so the check-then-set on
    /// `in_flight` cannot race with itself.
    fn begin_cycle(self: &Arc<Self>, runner: &Arc<CycleRunner>, reason: &'static str) {
        let (generation, filters) = {
            let state = self.lock();
            if !state.alive {
                return;
            }
            (state.generation, state.filters.clone())
        };

        let marker = generation + 1;
        if self.in_flight.load(Ordering::SeqCst) == marker {
            self.skipped_ticks.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(view = %self.view, reason, "Previous cycle still in flight; skipping.");
            return;
        }
        self.in_flight.store(marker, Ordering::SeqCst);

        let cycle = self.next_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(view = %self.view, cycle, generation, reason, "Starting refresh cycle.");

        let shared = Arc::clone(self);
        let runner = Arc::clone(runner);
        tokio::spawn(async move {
            shared.run_cycle(&runner, cycle, generation, filters).await;
        });
    }

    async fn run_cycle(&self, runner: &CycleRunner, cycle: u64, generation: u64, filters: ViewFilters) {
        let _in_flight = InFlight {
            slot: &self.in_flight,
            marker: generation + 1,
        };
        let fetch = time::timeout(runner.timeout, runner.source.fetch(self.view, &filters));
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = fetch => Some(result),
        };

        match outcome {
            None => {
                tracing::debug!(view = %self.view, cycle, "View torn down mid-cycle; result dropped.");
            }
            Some(Ok(Ok(data))) => {
                let snapshot = runner.engine.build(data, &filters, &runner.limits);
                self.publish(cycle, generation, snapshot);
            }
            Some(Ok(Err(e))) => {
                self.failed_cycles.fetch_add(1, Ordering::SeqCst);
                if e.is_unauthorized() {
                    tracing::error!(view = %self.view, cycle, "Refresh rejected: session is no longer authorised.");
                } else {
                    tracing::warn!(view = %self.view, cycle, error = %e, "Refresh cycle failed; keeping the previous snapshot.");
                }
            }
            Some(Err(_elapsed)) => {
                self.failed_cycles.fetch_add(1, Ordering::SeqCst);
                let e = EngineError::Timeout(runner.timeout);
                tracing::warn!(view = %self.view, cycle, error = %e, "Refresh cycle failed; keeping the previous snapshot.");
            }
        }
    }

    /// Applies a result only if the view is alive, the generation is current,
    /// and nothing newer has been published.
    fn publish(&self, cycle: u64, generation: u64, snapshot: ViewSnapshot) {
        let mut state = self.lock();
        if !state.alive {
            tracing::debug!(view = %self.view, cycle, "Discarding result for a torn-down view.");
            return;
        }
        if generation != state.generation {
            tracing::debug!(
                view = %self.view,
                cycle,
                generation,
                current = state.generation,
                "Discarding result computed under superseded filters."
            );
            return;
        }
        if cycle <= state.published_cycle {
            tracing::debug!(view = %self.view, cycle, published = state.published_cycle, "Discarding out-of-order result.");
            return;
        }

        state.published_cycle = cycle;
        self.publisher.send_replace(Some(Arc::new(Published {
            view: self.view,
            cycle,
            generation,
            fetched_at: Utc::now(),
            snapshot,
        })));
        self.published_cycles.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(view = %self.view, cycle, generation, "Published snapshot.");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// The per-view timer loop: one cycle on start, then one per tick or trigger.
async fn run_timer(shared: Arc<ViewShared>, runner: Arc<CycleRunner>, period: Option<Duration>) {
    shared.begin_cycle(&runner, "start");

    let mut ticker = period.map(|period| {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            _ = shared.trigger.notified() => shared.begin_cycle(&runner, "trigger"),
            _ = next_tick(&mut ticker) => shared.begin_cycle(&runner, "tick"),
        }
    }
    tracing::debug!(view = %shared.view, "Timer stopped.");
}

struct ViewHandle {
    shared: Arc<ViewShared>,
    timer: JoinHandle<()>,
}

impl ViewHandle {
    fn teardown(self) {
        self.shared.lock().alive = false;
        self.shared.cancel.cancel();
        self.timer.abort();
        tracing::info!(view = %self.shared.view, "View refresh cancelled.");
    }
}

/// A registry of periodically refreshed views.
///
/// Each registered view owns one timer task. A cycle fetches the view's raw
/// collections, builds a fresh snapshot and publishes it on the view's watch
/// channel; readers only ever see complete snapshots. Ticks that arrive while
/// a cycle of the same filter generation is still running are skipped. Failed
/// and timed-out cycles are logged and leave the previous snapshot in place.
///
/// Must be used from within a Tokio runtime.
pub struct RefreshScheduler {
    runner: Arc<CycleRunner>,
    refresh: RefreshConfig,
    views: Mutex<HashMap<ViewKind, ViewHandle>>,
}

impl RefreshScheduler {
    pub fn new(source: Arc<dyn SnapshotSource>, config: &Config) -> Self {
        Self {
            runner: Arc::new(CycleRunner {
                source,
                engine: AnalyticsEngine::new(),
                limits: snapshot_limits(config),
                timeout: config.api.request_timeout(),
            }),
            refresh: config.refresh.clone(),
            views: Mutex::new(HashMap::new()),
        }
    }

    fn views(&self) -> MutexGuard<'_, HashMap<ViewKind, ViewHandle>> {
        self.views.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn shared(&self, view: ViewKind) -> Result<Arc<ViewShared>, EngineError> {
        self.views()
            .get(&view)
            .map(|handle| Arc::clone(&handle.shared))
            .ok_or(EngineError::NotRunning(view))
    }

    /// Registers a view and runs its first cycle immediately.
    ///
    /// Starting a view that is already registered tears the old registration
    /// down first; its receivers see the channel close.
    pub fn start(&self, view: ViewKind, filters: ViewFilters) -> SnapshotReceiver {
        let (publisher, receiver) = watch::channel(None);
        let shared = Arc::new(ViewShared::new(view, filters, publisher));
        let period = view.interval(&self.refresh);

        tracing::info!(%view, interval_secs = ?period.map(|p| p.as_secs()), "Starting view refresh.");
        let timer = tokio::spawn(run_timer(Arc::clone(&shared), Arc::clone(&self.runner), period));

        let previous = self.views().insert(view, ViewHandle { shared, timer });
        if let Some(previous) = previous {
            previous.teardown();
        }
        receiver
    }

    /// Another receiver for a running view.
    pub fn subscribe(&self, view: ViewKind) -> Option<SnapshotReceiver> {
        self.views().get(&view).map(|handle| handle.shared.publisher.subscribe())
    }

    /// Replaces the view's filters and recomputes from a fresh fetch.
    ///
    /// Any cycle still running under the old filters is discarded when it completes.
    pub fn set_filters(&self, view: ViewKind, filters: ViewFilters) -> Result<(), EngineError> {
        let shared = self.shared(view)?;
        {
            let mut state = shared.lock();
            state.generation += 1;
            state.filters = filters;
            tracing::info!(%view, generation = state.generation, "Filters changed.");
        }
        shared.trigger.notify_one();
        Ok(())
    }

    /// Requests an immediate cycle, subject to the usual overlap suppression.
    pub fn refresh_now(&self, view: ViewKind) -> Result<(), EngineError> {
        self.shared(view)?.trigger.notify_one();
        Ok(())
    }

    pub fn cancel(&self, view: ViewKind) -> Result<(), EngineError> {
        let handle = self.views().remove(&view).ok_or(EngineError::NotRunning(view))?;
        handle.teardown();
        Ok(())
    }

    pub fn cancel_all(&self) {
        let handles: Vec<ViewHandle> = self.views().drain().map(|(_, handle)| handle).collect();
        for handle in handles {
            handle.teardown();
        }
    }

    pub fn is_running(&self, view: ViewKind) -> bool {
        self.views().contains_key(&view)
    }

    pub fn active_views(&self) -> Vec<ViewKind> {
        let mut views: Vec<ViewKind> = self.views().keys().copied().collect();
        views.sort();
        views
    }

    pub fn stats(&self, view: ViewKind) -> Option<ViewStats> {
        self.views().get(&view).map(|handle| handle.shared.stats())
    }

    /// Runs a single unscheduled cycle and returns its snapshot.
    pub async fn snapshot_once(&self, view: ViewKind, filters: &ViewFilters) -> Result<ViewSnapshot, EngineError> {
        let runner = &self.runner;
        let data = time::timeout(runner.timeout, runner.source.fetch(view, filters))
            .await
            .map_err(|_| EngineError::Timeout(runner.timeout))??;
        Ok(runner.engine.build(data, filters, &runner.limits))
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
