//! Fluent builder for constructing a [`Scheduler`].

use std::sync::Arc;

use hl_core::{Minute, TimeSource, VirtualClock};
use hl_routing::{DijkstraPathFinder, PathFinder};
use hl_store::LogisticsStore;

use crate::{Scheduler, SchedulerConfig, SimError, SimResult, TransportAdvancer};

/// Fluent builder for [`Scheduler<S, P, T>`].
///
/// # Required inputs
///
/// - `S: LogisticsStore`: the scheduler's own store handle
/// - `Arc<VirtualClock<T>>`: the clock shared with the admin surface
///
/// # Optional inputs (have defaults)
///
/// | Method             | Default                                    |
/// |--------------------|--------------------------------------------|
/// | `.path_finder(p)`  | [`DijkstraPathFinder`]                     |
/// | `.config(c)`       | [`SchedulerConfig::default()`]             |
/// | `.start_minute(m)` | the minute after the clock's current one   |
///
/// # Example
///
/// ```rust,ignore
/// let clock = Arc::new(VirtualClock::new());
/// let mut scheduler = SchedulerBuilder::new(SqliteStore::open(path)?, clock)
///     .config(SchedulerConfig { max_sleep: Duration::from_secs(1), ..Default::default() })
///     .build()?;
/// scheduler.run(&mut NoopObserver);
/// ```
pub struct SchedulerBuilder<S: LogisticsStore, P: PathFinder, T: TimeSource> {
    store:        S,
    clock:        Arc<VirtualClock<T>>,
    path_finder:  P,
    config:       SchedulerConfig,
    start_minute: Option<Minute>,
}

impl<S: LogisticsStore, T: TimeSource> SchedulerBuilder<S, DijkstraPathFinder, T> {
    pub fn new(store: S, clock: Arc<VirtualClock<T>>) -> Self {
        Self {
            store,
            clock,
            path_finder:  DijkstraPathFinder,
            config:       SchedulerConfig::default(),
            start_minute: None,
        }
    }
}

impl<S: LogisticsStore, P: PathFinder, T: TimeSource> SchedulerBuilder<S, P, T> {
    /// Route with `path_finder` instead of Dijkstra.
    pub fn path_finder<Q: PathFinder>(self, path_finder: Q) -> SchedulerBuilder<S, Q, T> {
        SchedulerBuilder {
            store:        self.store,
            clock:        self.clock,
            path_finder,
            config:       self.config,
            start_minute: self.start_minute,
        }
    }

    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// First minute to process.
    ///
    /// Normally left unset: a fresh scheduler begins at the boundary after
    /// the current virtual minute and never replays the past.
    pub fn start_minute(mut self, minute: Minute) -> Self {
        self.start_minute = Some(minute);
        self
    }

    pub fn build(self) -> SimResult<Scheduler<S, P, T>> {
        if self.config.max_sleep.is_zero() {
            return Err(SimError::Config("max_sleep must be positive".into()));
        }
        let next_minute = match self.start_minute {
            Some(m) => m,
            None => self.clock.current_minute().next(),
        };
        Ok(Scheduler {
            store: self.store,
            advancer: TransportAdvancer::new(self.path_finder),
            clock: self.clock,
            config: self.config,
            next_minute,
        })
    }
}
