//! Virtual-minute time model.
//!
//! # Design
//!
//! The [`VirtualClock`](crate::VirtualClock) produces continuous virtual
//! seconds (`f64`).  Everything the scheduler persists is discretised to
//! whole minutes:
//!
//!   minute = floor(virtual_secs / 60)
//!
//! Using an integer minute as the unit of leg timestamps keeps all duration
//! arithmetic exact and makes "is this leg due?" a single integer compare.

use std::fmt;

/// Seconds in one virtual minute.
pub const SECS_PER_MINUTE: f64 = 60.0;

// ── Minute ────────────────────────────────────────────────────────────────────

/// An absolute virtual-minute index.
///
/// Signed because it is stored in SQLite `INTEGER` columns and because a
/// clock started at (or jumped to) a negative time is legal.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Minute(pub i64);

impl Minute {
    /// The minute containing virtual second `secs`.
    #[inline]
    pub fn containing(secs: f64) -> Minute {
        Minute((secs / SECS_PER_MINUTE).floor() as i64)
    }

    /// Virtual second at which this minute begins.
    #[inline]
    pub fn start_secs(self) -> f64 {
        self.0 as f64 * SECS_PER_MINUTE
    }

    /// The following minute.
    #[inline]
    pub fn next(self) -> Minute {
        Minute(self.0 + 1)
    }

    /// Minutes elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: Minute) -> i64 {
        self.0 - earlier.0
    }

    /// `true` once `duration` whole minutes have passed since `start`.
    #[inline]
    pub fn has_elapsed(self, start: Minute, duration: u32) -> bool {
        self.since(start) >= i64::from(duration)
    }
}

impl fmt::Display for Minute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}
