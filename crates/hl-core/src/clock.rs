//! Scalable, jumpable, thread-safe virtual clock.
//!
//! # Accumulator model
//!
//! The clock never computes `start + real_elapsed * scale` from scratch;
//! that would retroactively rescale the whole history whenever the scale
//! changes.  Instead each observation charges only the real time elapsed
//! *since the previous observation*, at the scale in effect during it:
//!
//! ```text
//! virtual += (real_now - last_real) * scale
//! last_real = real_now
//! ```
//!
//! `set_scale` and `jump` first materialise the pending interval under the
//! current scale and only then apply their change, all inside one critical
//! section.
//!
//! # Sharing
//!
//! There is no global clock.  Construct one and share it as
//! `Arc<VirtualClock>` between the scheduler thread and whatever
//! administrative surface mutates it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::Minute;

// ── TimeSource ────────────────────────────────────────────────────────────────

/// Source of real (wall) elapsed time.
///
/// Only differences between readings matter, so the origin is arbitrary, but
/// readings must never go backwards.
pub trait TimeSource: Send + Sync {
    /// Real time elapsed since this source's origin.
    fn now(&self) -> Duration;
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    #[inline]
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Production source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicSource {
    origin: Instant,
}

impl MonotonicSource {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicSource {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A source that only moves when told to.  Makes clock and scheduler tests
/// exact instead of timing-dependent.
#[derive(Debug, Default)]
pub struct ManualSource {
    now: Mutex<Duration>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move real time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl TimeSource for ManualSource {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── VirtualClock ──────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ClockState {
    /// Virtual seconds per real second, always finite.  `<= 0` means paused
    /// (or rewinding for negative values).
    scale:        f64,
    /// Source reading at the last observation.
    last_real:    Duration,
    /// Accumulated virtual seconds.
    virtual_secs: f64,
}

impl ClockState {
    /// Charge the interval since `last_real` at the current scale.
    fn materialise(&mut self, real_now: Duration) -> f64 {
        let delta = real_now.saturating_sub(self.last_real);
        self.virtual_secs += delta.as_secs_f64() * self.scale;
        self.last_real = self.last_real.max(real_now);
        self.virtual_secs
    }
}

/// The simulation's virtual time source.
///
/// All operations take `&self`; the accumulator lives behind one internal
/// mutex.  The source is read *inside* the critical section so concurrent
/// callers observe strictly ordered readings.
#[derive(Debug)]
pub struct VirtualClock<S: TimeSource = MonotonicSource> {
    source: S,
    state:  Mutex<ClockState>,
}

impl VirtualClock<MonotonicSource> {
    /// A clock at scale 1.0 whose virtual time starts at the current Unix time.
    pub fn new() -> Self {
        Self::starting_at(unix_now_secs())
    }

    /// A clock at scale 1.0 whose virtual time starts at `start_secs`.
    pub fn starting_at(start_secs: f64) -> Self {
        Self::with_source(MonotonicSource::new(), start_secs)
    }
}

impl Default for VirtualClock<MonotonicSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource> VirtualClock<S> {
    /// A clock at scale 1.0 over an explicit real-time source.
    pub fn with_source(source: S, start_secs: f64) -> Self {
        let last_real = source.now();
        Self {
            source,
            state: Mutex::new(ClockState {
                scale: 1.0,
                last_real,
                virtual_secs: start_secs,
            }),
        }
    }

    /// Current virtual time in seconds.
    ///
    /// Advances the accumulator by the real time elapsed since the previous
    /// observation multiplied by the current scale.
    pub fn get_time(&self) -> f64 {
        let mut state = self.lock();
        let now = self.source.now();
        state.materialise(now)
    }

    /// The virtual minute containing [`get_time`](Self::get_time).
    pub fn current_minute(&self) -> Minute {
        Minute::containing(self.get_time())
    }

    /// Install a new scale.
    ///
    /// Time elapsed before this call is charged at the *old* scale.  Any
    /// finite value is accepted; non-positive scales pause (or rewind) the
    /// clock.  NaN and infinities are ignored, since one non-finite product
    /// would poison the accumulator for good.
    pub fn set_scale(&self, new_scale: f64) {
        if !new_scale.is_finite() {
            warn!(new_scale, "ignoring non-finite clock scale");
            return;
        }
        let mut state = self.lock();
        let now = self.source.now();
        state.materialise(now);
        let old_scale = state.scale;
        state.scale = new_scale;
        drop(state);
        info!(old_scale, new_scale, "virtual clock scale changed");
    }

    pub fn get_scale(&self) -> f64 {
        self.lock().scale
    }

    /// Add `delta` to virtual time, exactly and independent of scale.
    pub fn jump(&self, delta: Duration) {
        let mut state = self.lock();
        let now = self.source.now();
        state.materialise(now);
        state.virtual_secs += delta.as_secs_f64();
        let virtual_secs = state.virtual_secs;
        drop(state);
        info!(jump_secs = delta.as_secs_f64(), virtual_secs, "virtual clock jumped");
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Seconds since the Unix epoch, or `0.0` if the system clock is before it.
pub fn unix_now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
