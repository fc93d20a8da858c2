use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::appender::Appender;
use crate::clock::{Clock, SystemClock};
use crate::config::{Format, Settings, DEFAULT_ENTRY_CAPACITY};
use crate::entry::Entry;
use crate::error::Error;
use crate::level::Level;

/// The destination shared by every logger of one pool.
///
/// One mutex guards the writer, so concurrent lines never interleave and
/// appear in the order the lock was acquired.
pub(crate) struct Sink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Sink {
    pub(crate) fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer: Mutex::new(writer) }
    }

    pub(crate) fn write_line(&self, line: &[u8]) -> io::Result<()> {
        self.writer.lock().write_all(line)
    }

    pub(crate) fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }
}

/// A named logger holding one pool of reusable entries per enabled level.
///
/// Loggers come from a [`Pool`](crate::Pool) and live as long as it does.
/// Each level method hands out an [`Entry`]: below the logger's threshold
/// that entry is a no-op and costs nothing; otherwise it is popped from the
/// level's pool (or built if the pool is empty) and goes back there when it
/// is logged or dropped.
///
/// ```
/// # use pool_logger::{Config, Level, Output, Pool};
/// let pool = Pool::new(Config::new().level(Level::Warn).output(Output::writer(std::io::sink()))).unwrap();
/// let logger = pool.logger("jobs");
/// assert!(logger.info().is_noop());
/// assert!(!logger.warn().is_noop());
/// ```
pub struct Logger {
    name: Arc<str>,
    level: Level,
    format: Format,
    entry_capacity: usize,
    clock: Arc<dyn Clock>,
    sink: Arc<Sink>,
    // pools[i] holds idle entries for the level with ordinal `level + i`.
    pools: Mutex<Vec<Vec<Appender>>>,
}

impl Logger {
    pub(crate) fn new(name: &str, settings: &Settings, sink: Arc<Sink>) -> Result<Self, Error> {
        let enabled = (Level::None.ordinal() - settings.level.ordinal()) as usize;
        let mut pools = Vec::new();
        pools.try_reserve_exact(enabled)?;
        pools.resize_with(enabled, Vec::new);

        Ok(Self {
            name: Arc::from(name),
            level: settings.level,
            format: settings.format,
            entry_capacity: settings.entry_capacity,
            clock: settings.clock.clone(),
            sink,
            pools: Mutex::new(pools),
        })
    }

    /// A logger with no enabled levels, writing nowhere.
    pub(crate) fn noop(sink: Arc<Sink>) -> Self {
        Self {
            name: Arc::from(""),
            level: Level::None,
            format: Format::Json,
            entry_capacity: DEFAULT_ENTRY_CAPACITY,
            clock: Arc::new(SystemClock),
            sink,
            pools: Mutex::new(Vec::new()),
        }
    }

    /// The name this logger was requested under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lowest level this logger emits.
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Whether entries at `level` produce output.
    ///
    /// # Arguments
    ///
    /// * `level` - The level to check
    ///
    /// # Returns
    ///
    /// `true` when `level` is at or above the threshold and is not
    /// `Level::None`
    #[inline(always)]
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level && level < Level::None
    }

    /// Starts a `Fine` entry, the most verbose level.
    pub fn fine(&self) -> Entry<'_> {
        self.at(Level::Fine)
    }

    /// Starts a `Debug` entry.
    pub fn debug(&self) -> Entry<'_> {
        self.at(Level::Debug)
    }

    /// Starts an `Info` entry.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pool_logger::{Config, Output, Pool};
    /// let pool = Pool::new(Config::new().output(Output::writer(std::io::sink()))).unwrap();
    /// let logger = pool.logger("api");
    /// logger.info().str("route", "/health").int("status", 200).log();
    /// ```
    pub fn info(&self) -> Entry<'_> {
        self.at(Level::Info)
    }

    /// Starts a `Warn` entry.
    pub fn warn(&self) -> Entry<'_> {
        self.at(Level::Warn)
    }

    /// Starts an `Error` entry. Attach the error itself with [`Entry::err`].
    pub fn err(&self) -> Entry<'_> {
        self.at(Level::Error)
    }

    /// Starts a `Fatal` entry. Logging at this level does not stop the
    /// process.
    pub fn fatal(&self) -> Entry<'_> {
        self.at(Level::Fatal)
    }

    /// Starts an entry at a level chosen at runtime.
    ///
    /// The entry is taken from the level's pool, or built when the pool is
    /// empty, and its header is stamped with the current time.
    ///
    /// # Arguments
    ///
    /// * `level` - Severity of the record
    ///
    /// # Returns
    ///
    /// A no-op entry when `level` is filtered out or a new entry could not be
    /// allocated; otherwise a pooled entry
    ///
    /// # Examples
    ///
    /// ```
    /// # use pool_logger::{Config, Level, Output, Pool};
    /// let pool = Pool::new(Config::new().output(Output::writer(std::io::sink()))).unwrap();
    /// let logger = pool.logger("jobs");
    /// let level: Level = "warning".parse().unwrap();
    /// logger.at(level).str("job", "reindex").log();
    /// assert_eq!(logger.idle_entries(Level::Warn), 1);
    /// ```
    pub fn at(&self, level: Level) -> Entry<'_> {
        if !self.is_enabled(level) {
            return Entry::noop();
        }

        let reused = self.pools.lock().get_mut(self.slot(level)).and_then(Vec::pop);
        let mut appender = match reused {
            Some(appender) => appender,
            None => match Appender::new(self.format, level, self.name.clone(), self.entry_capacity) {
                Ok(appender) => appender,
                Err(err) => {
                    log::warn!(target: "pool_logger", "logger {:?}: {} entry unavailable: {}", self.name, level, err);
                    return Entry::noop();
                }
            },
        };
        appender.begin(self.clock.now_nanos());
        Entry::pooled(self, appender)
    }

    /// Number of idle entries pooled for `level`.
    pub fn idle_entries(&self, level: Level) -> usize {
        if !self.is_enabled(level) {
            return 0;
        }
        self.pools.lock().get(self.slot(level)).map_or(0, Vec::len)
    }

    pub(crate) fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Puts a finished entry back on the pool for its own level.
    pub(crate) fn release(&self, appender: Appender) {
        let level = appender.level();
        if !self.is_enabled(level) {
            return;
        }
        let slot = self.slot(level);
        let mut pools = self.pools.lock();
        if let Some(pool) = pools.get_mut(slot) {
            // Under memory pressure the entry is simply freed.
            if pool.try_reserve(1).is_ok() {
                pool.push(appender);
            }
        }
    }

    fn slot(&self, level: Level) -> usize {
        (level.ordinal() - self.level.ordinal()) as usize
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
