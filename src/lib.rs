//! # Pool Logger
//!
//! A structured logger for concurrent programs that writes one JSON or text
//! line per record to a single shared output:
//!
//! * **Pooled entries**: each logger keeps a stack of reusable entries per
//!   level, so steady-state logging does not allocate
//! * **Cheap filtering**: a level below the threshold returns a no-op entry
//!   that never touches a buffer
//! * **Atomic lines**: every logger of a pool writes through one mutex, so
//!   lines from different threads never interleave
//! * **Correlation ids**: a ULID generator for time-ordered identifiers
//!
//! ## Main Components
//!
//! * `Pool`: name-keyed registry of loggers sharing one output
//! * `Logger`: hands out and reclaims `Entry` values per level
//! * `Entry`: chained field builder, terminated by `log()`
//! * `ulid`: 128-bit sortable identifiers and their generator
//! * `global`: optional process-wide pool
//!
//! ## Quick Start
//!
//! ```
//! use pool_logger::{src, Config, Format, Level, Output, Pool};
//!
//! let pool = Pool::new(
//!     Config::new()
//!         .level(Level::Debug)
//!         .format(Format::Json)
//!         .output(Output::Stdout),
//! ).unwrap();
//!
//! let logger = pool.logger("payments");
//! logger.info()
//!     .msg("charge accepted")
//!     .str("customer", "c_42")
//!     .int("amount", 1999)
//!     .src(src!())
//!     .log();
//!
//! // Filtered out: nothing is written, nothing is allocated.
//! logger.fine().str("detail", "skipped").log();
//! ```

mod appender;
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod global;
pub mod level;
pub mod logger;
pub mod pool;
pub mod ulid;

pub use config::{Config, Format, Output};
pub use entry::{Entry, FloatValue, IntValue, Src};
pub use error::{DecodeError, Error, GenerateError};
pub use level::Level;
pub use logger::Logger;
pub use pool::Pool;
pub use ulid::{Generator, Ulid};

/// Captures the current file, enclosing function and line as a [`Src`].
///
/// ```
/// # use pool_logger::src;
/// let here = src!();
/// assert!(here.file.ends_with(".rs"));
/// assert!(here.line > 0);
/// ```
#[macro_export]
macro_rules! src {
    () => {{
        fn __here() {}
        fn __name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __name_of(__here);
        $crate::Src {
            file: file!(),
            function: name.strip_suffix("::__here").unwrap_or(name),
            line: line!(),
        }
    }};
}
