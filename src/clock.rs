use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock time for log headers and ULIDs.
///
/// Loggers and generators hold an `Arc<dyn Clock>`, so the real clock can be
/// swapped for a simulated one in tests. Any `Fn() -> i64` closure is a
/// clock too.
///
/// # Examples
///
/// ```
/// # use pool_logger::clock::{Clock, SimulatedClock};
/// # use std::time::Duration;
/// let clock = SimulatedClock::new(1_000_000_000);
/// clock.advance(Duration::from_millis(5));
/// assert_eq!(clock.now_nanos(), 1_005_000_000);
///
/// let fixed = || 42i64;
/// assert_eq!(fixed.now_nanos(), 42);
/// ```
pub trait Clock: Send + Sync {
    /// Signed nanoseconds since the Unix epoch.
    fn now_nanos(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline(always)]
    fn now_nanos(&self) -> i64 {
        get_timestamp()
    }
}

/// A manually driven clock for deterministic tests and simulation.
#[derive(Debug, Default)]
pub struct SimulatedClock {
    nanos: AtomicI64,
}

impl SimulatedClock {
    pub const fn new(start_nanos: i64) -> Self {
        Self { nanos: AtomicI64::new(start_nanos) }
    }

    pub fn set(&self, nanos: i64) {
        self.nanos.store(nanos, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let delta = i64::try_from(by.as_nanos()).unwrap_or(i64::MAX);
        self.nanos.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for SimulatedClock {
    fn now_nanos(&self) -> i64 {
        self.nanos.load(Ordering::SeqCst)
    }
}

impl<F> Clock for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn now_nanos(&self) -> i64 {
        self()
    }
}

/// Nanoseconds since the Unix epoch from the system clock.
///
/// Times before the epoch come back negative; times past the `i64` range
/// saturate.
pub fn get_timestamp() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(since) => i64::try_from(since.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_nanos()).map_or(i64::MIN, |n| -n),
    }
}
