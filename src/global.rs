//! Process-wide logger pool.
//!
//! The pool is installed with [`init`] and removed with [`deinit`]; between
//! the two, any thread can fetch loggers through [`logger`]. Using it outside
//! that window returns [`Error::NotInitialized`] instead of panicking.
//!
//! # Examples
//!
//! ```
//! # use pool_logger::{global, Config, Output};
//! global::init(Config::new().output(Output::writer(std::io::sink()))).unwrap();
//! global::logger("startup").unwrap().info().str("phase", "boot").log();
//! global::deinit().unwrap();
//! assert!(global::logger("startup").is_err());
//! ```

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Error;
use crate::logger::Logger;
use crate::pool::Pool;

lazy_static! {
    static ref GLOBAL_POOL: Mutex<Option<Arc<Pool>>> = Mutex::new(None);
}

/// Installs the process-wide pool.
pub fn init(config: Config) -> Result<(), Error> {
    let mut global = GLOBAL_POOL.lock();
    if global.is_some() {
        return Err(Error::AlreadyInitialized);
    }
    *global = Some(Arc::new(Pool::new(config)?));
    Ok(())
}

/// The process-wide pool.
pub fn pool() -> Result<Arc<Pool>, Error> {
    GLOBAL_POOL.lock().clone().ok_or(Error::NotInitialized)
}

/// The logger called `name` from the process-wide pool.
pub fn logger(name: &str) -> Result<Arc<Logger>, Error> {
    Ok(pool()?.logger(name))
}

pub fn is_initialized() -> bool {
    GLOBAL_POOL.lock().is_some()
}

/// Removes the process-wide pool and flushes its output.
///
/// Handles obtained earlier keep working until they are dropped; the pool
/// itself is released with the last of them.
pub fn deinit() -> Result<(), Error> {
    let pool = GLOBAL_POOL.lock().take().ok_or(Error::NotInitialized)?;
    pool.flush();
    Ok(())
}
