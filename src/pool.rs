use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{Config, Settings};
use crate::error::Error;
use crate::logger::{Logger, Sink};

/// Registry of named loggers sharing one output.
///
/// Loggers are created on first lookup and cached for the lifetime of the
/// pool; the same name always yields the same `Arc<Logger>`. Lookups take a
/// read lock and only a miss takes the write lock.
///
/// # Examples
///
/// ```
/// # use pool_logger::{Config, Output, Pool};
/// # use std::sync::Arc;
/// let pool = Pool::new(Config::new().output(Output::writer(std::io::sink()))).unwrap();
/// let a = pool.logger("db");
/// let b = pool.logger("db");
/// assert!(Arc::ptr_eq(&a, &b));
/// pool.deinit();
/// ```
pub struct Pool {
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
    settings: Settings,
    sink: Arc<Sink>,
    noop: Arc<Logger>,
}

impl Pool {
    pub fn new(config: Config) -> Result<Self, Error> {
        let (settings, writer) = config.split();
        let sink = Arc::new(Sink::new(writer));
        let mut loggers = HashMap::new();
        loggers.try_reserve(8)?;

        Ok(Self {
            loggers: RwLock::new(loggers),
            noop: Arc::new(Logger::noop(sink.clone())),
            settings,
            sink,
        })
    }

    /// The logger called `name`, creating it on first use.
    ///
    /// Never fails: if the logger cannot be built, a warning goes to the
    /// `log` facade and the pool's no-op logger is returned instead.
    pub fn logger(&self, name: &str) -> Arc<Logger> {
        // Fast path: already cached
        if let Some(logger) = self.loggers.read().get(name) {
            return logger.clone();
        }

        let mut loggers = self.loggers.write();
        // Another thread may have won the race for the write lock.
        if let Some(logger) = loggers.get(name) {
            return logger.clone();
        }

        let logger = match Logger::new(name, &self.settings, self.sink.clone()) {
            Ok(logger) => Arc::new(logger),
            Err(err) => {
                log::warn!(target: "pool_logger", "could not create logger {:?}: {}", name, err);
                return self.noop.clone();
            }
        };
        if let Err(err) = loggers.try_reserve(1) {
            log::warn!(target: "pool_logger", "could not cache logger {:?}: {}", name, err);
            return self.noop.clone();
        }
        loggers.insert(name.to_string(), logger.clone());
        logger
    }

    /// The logger that discards everything.
    pub fn noop(&self) -> Arc<Logger> {
        self.noop.clone()
    }

    /// Number of cached loggers.
    pub fn len(&self) -> usize {
        self.loggers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes the shared output.
    pub fn flush(&self) {
        if let Err(err) = self.sink.flush() {
            log::warn!(target: "pool_logger", "flushing log output failed: {}", err);
        }
    }

    /// Flushes the output and releases every cached logger and its entries.
    ///
    /// Consumes the pool, so it can only happen once. Loggers still held
    /// elsewhere stay usable until their last handle goes away.
    pub fn deinit(self) {
        drop(self);
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.flush();
        self.loggers.get_mut().clear();
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("loggers", &self.len())
            .field("level", &self.settings.level)
            .field("format", &self.settings.format)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Output;
    use crate::level::Level;

    fn pool(level: Level) -> Pool {
        Pool::new(Config::new().level(level).output(Output::writer(std::io::sink()))).unwrap()
    }

    #[test]
    fn test_loggers_are_cached() {
        let pool = pool(Level::Info);
        assert!(pool.is_empty());
        let a = pool.logger("a");
        let b = pool.logger("b");
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &pool.logger("a")));
        assert_eq!(pool.len(), 2);
        assert_eq!(a.name(), "a");
    }

    #[test]
    fn test_loggers_inherit_settings() {
        let pool = pool(Level::Error);
        let logger = pool.logger("x");
        assert_eq!(logger.level(), Level::Error);
        assert!(!logger.is_enabled(Level::Warn));
    }

    #[test]
    fn test_noop_is_not_cached() {
        let pool = pool(Level::Info);
        let noop = pool.noop();
        assert!(noop.info().is_noop());
        assert!(pool.is_empty());
    }
}
