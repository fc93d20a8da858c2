use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::level::Level;

/// Initial bytes reserved for each entry's buffer.
pub const DEFAULT_ENTRY_CAPACITY: usize = 512;

/// Line encoding of a logger. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Json,
    Text,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Text => f.write_str("text"),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "text" | "logfmt" => Ok(Format::Text),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

/// Destination every logger of a pool writes to.
pub enum Output {
    Stdout,
    Stderr,
    Writer(Box<dyn Write + Send>),
}

impl Output {
    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        Output::Writer(Box::new(writer))
    }

    pub(crate) fn into_writer(self) -> Box<dyn Write + Send> {
        match self {
            Output::Stdout => Box::new(io::stdout()),
            Output::Stderr => Box::new(io::stderr()),
            Output::Writer(writer) => writer,
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Stdout => f.write_str("Stdout"),
            Output::Stderr => f.write_str("Stderr"),
            Output::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Options for building a [`Pool`](crate::Pool).
///
/// # Examples
///
/// ```
/// # use pool_logger::{Config, Format, Level, Output};
/// let config = Config::new()
///     .level(Level::Warn)
///     .format(Format::Text)
///     .output(Output::Stderr);
/// assert_eq!(config.level, Level::Warn);
/// ```
pub struct Config {
    /// Minimum severity that is emitted.
    pub level: Level,
    pub format: Format,
    pub output: Output,
    pub clock: Arc<dyn Clock>,
    /// Bytes reserved up front for each new entry.
    pub entry_capacity: usize,
}

impl Config {
    /// Creates a config with the defaults: `Info`, JSON, stdout, the system
    /// clock and [`DEFAULT_ENTRY_CAPACITY`] bytes per entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum severity that is emitted.
    ///
    /// Levels below it get no entry pool and cost nothing to call.
    /// `Level::None` silences every logger of the pool.
    ///
    /// # Arguments
    ///
    /// * `level` - The lowest level that produces output
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the line format shared by all loggers of the pool.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Sets where lines are written.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pool_logger::{Config, Output};
    /// let file = tempfile::tempfile().unwrap();
    /// let config = Config::new().output(Output::writer(std::io::BufWriter::new(file)));
    /// ```
    pub fn output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    /// Replaces the time source used for line timestamps.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the bytes reserved for each newly built entry.
    ///
    /// An entry whose reservation fails is replaced by a no-op entry and a
    /// warning goes to the `log` facade. Lines longer than the capacity still
    /// work; the buffer grows and keeps its size when reused.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Initial buffer size in bytes
    pub fn entry_capacity(mut self, capacity: usize) -> Self {
        self.entry_capacity = capacity;
        self
    }

    /// Splits the config into what loggers keep and the sink writer.
    pub(crate) fn split(self) -> (Settings, Box<dyn Write + Send>) {
        let settings = Settings {
            level: self.level,
            format: self.format,
            clock: self.clock,
            entry_capacity: self.entry_capacity,
        };
        (settings, self.output.into_writer())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            output: Output::Stdout,
            clock: Arc::new(SystemClock),
            entry_capacity: DEFAULT_ENTRY_CAPACITY,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("level", &self.level)
            .field("format", &self.format)
            .field("output", &self.output)
            .field("entry_capacity", &self.entry_capacity)
            .finish_non_exhaustive()
    }
}

/// The per-logger part of a [`Config`], shared by every logger of a pool.
#[derive(Clone)]
pub(crate) struct Settings {
    pub level: Level,
    pub format: Format,
    pub clock: Arc<dyn Clock>,
    pub entry_capacity: usize,
}
