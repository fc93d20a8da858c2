use std::error::Error as StdError;
use std::ffi::CStr;
use std::fmt;

use serde::Serialize;

use crate::appender::{Appender, Radix};
use crate::level::Level;
use crate::logger::Logger;
use crate::ulid::Ulid;

/// Source location attached with [`Entry::src`]. Build one with [`src!`](crate::src).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Src {
    pub file: &'static str,
    pub function: &'static str,
    pub line: u32,
}

/// Integer types accepted by [`Entry::int`], [`Entry::intx`] and
/// [`Entry::intb`], with or without an `Option` around them.
pub trait IntValue {
    fn into_int(self) -> Option<i128>;
}

macro_rules! impl_int_value {
    ($($t:ty),*) => {
        $(
            impl IntValue for $t {
                #[inline(always)]
                fn into_int(self) -> Option<i128> {
                    Some(self as i128)
                }
            }

            impl IntValue for Option<$t> {
                #[inline(always)]
                fn into_int(self) -> Option<i128> {
                    self.map(|v| v as i128)
                }
            }
        )*
    };
}

impl_int_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

/// Float types accepted by [`Entry::float`].
pub trait FloatValue {
    fn into_float(self) -> Option<f64>;
}

macro_rules! impl_float_value {
    ($($t:ty),*) => {
        $(
            impl FloatValue for $t {
                #[inline(always)]
                fn into_float(self) -> Option<f64> {
                    Some(self as f64)
                }
            }

            impl FloatValue for Option<$t> {
                #[inline(always)]
                fn into_float(self) -> Option<f64> {
                    self.map(|v| v as f64)
                }
            }
        )*
    };
}

impl_float_value!(f32, f64);

/// A log record being built.
///
/// An `Entry` is borrowed from its logger's pool for one level. Field
/// methods consume and return it so calls chain; [`log`](Entry::log)
/// writes the line. Whether or not `log` is called, dropping the entry
/// returns it to the pool it came from.
///
/// Entries for filtered-out levels, or created while memory was short, are
/// no-ops: every call on them is discarded without touching a buffer.
///
/// ```
/// # use pool_logger::{Config, Output, Pool};
/// let pool = Pool::new(Config::new().output(Output::writer(std::io::sink()))).unwrap();
/// let logger = pool.logger("http");
/// logger.info()
///     .str("method", "GET")
///     .int("status", 200)
///     .int("bytes", None::<u64>)
///     .log();
/// ```
#[must_use = "an entry writes nothing until `log` is called"]
pub struct Entry<'a> {
    appender: Appender,
    home: Option<&'a Logger>,
}

impl<'a> Entry<'a> {
    pub(crate) fn pooled(home: &'a Logger, appender: Appender) -> Self {
        Self { appender, home: Some(home) }
    }

    /// An entry that discards everything.
    ///
    /// Loggers hand these out for filtered levels; they never touch a buffer
    /// or a lock.
    pub fn noop() -> Self {
        Self { appender: Appender::Noop, home: None }
    }

    /// Whether this entry discards everything written to it.
    pub fn is_noop(&self) -> bool {
        self.appender.is_noop()
    }

    /// Level this entry will be written at; `Level::None` for a no-op.
    pub fn level(&self) -> Level {
        self.appender.level()
    }

    /// Adds a string field, escaped for the line format.
    ///
    /// # Arguments
    ///
    /// * `key` - Field name
    /// * `value` - The string, or `None` to write `null`
    ///
    /// # Examples
    ///
    /// ```
    /// # use pool_logger::{Config, Output, Pool};
    /// # let pool = Pool::new(Config::new().output(Output::writer(std::io::sink()))).unwrap();
    /// let user: Option<&str> = None;
    /// pool.logger("auth").info().str("method", "token").str("user", user).log();
    /// ```
    pub fn str<'v>(mut self, key: &str, value: impl Into<Option<&'v str>>) -> Self {
        self.appender.str_field(key, value.into());
        self
    }

    /// Like [`str`](Entry::str) for NUL-terminated strings. Invalid UTF-8 is
    /// replaced.
    pub fn str_z<'v>(mut self, key: &str, value: impl Into<Option<&'v CStr>>) -> Self {
        match value.into() {
            Some(value) => self.appender.str_field(key, Some(&*value.to_string_lossy())),
            None => self.appender.str_field(key, None),
        }
        self
    }

    /// Adds a decimal integer field.
    ///
    /// # Arguments
    ///
    /// * `key` - Field name
    /// * `value` - Any primitive integer, or an `Option` of one; `None` is
    ///   written as `null`
    pub fn int(mut self, key: &str, value: impl IntValue) -> Self {
        self.appender.int_field(key, value.into_int());
        self
    }

    /// Integer written as a `0x`-prefixed hexadecimal string.
    pub fn intx(mut self, key: &str, value: impl IntValue) -> Self {
        self.appender.radix_field(key, value.into_int(), Radix::Hex);
        self
    }

    /// Integer written as a `0b`-prefixed binary string.
    pub fn intb(mut self, key: &str, value: impl IntValue) -> Self {
        self.appender.radix_field(key, value.into_int(), Radix::Binary);
        self
    }

    /// Adds a floating point field.
    ///
    /// Non-finite values become `null` in JSON and are written as `NaN`,
    /// `inf` or `-inf` in text.
    pub fn float(mut self, key: &str, value: impl FloatValue) -> Self {
        self.appender.float_field(key, value.into_float());
        self
    }

    /// Adds `true`, `false` or `null`.
    pub fn boolean(mut self, key: &str, value: impl Into<Option<bool>>) -> Self {
        self.appender.bool_field(key, value.into());
        self
    }

    /// Any serializable value, embedded as JSON. A value that fails to
    /// serialize is written as `null`. In text lines the JSON is quoted when
    /// it contains spaces, `=` or quotes.
    ///
    /// # Arguments
    ///
    /// * `key` - Field name
    /// * `value` - A reference to the value, or `None` to write `null`
    ///
    /// # Examples
    ///
    /// ```
    /// # use pool_logger::{Config, Output, Pool};
    /// # let pool = Pool::new(Config::new().output(Output::writer(std::io::sink()))).unwrap();
    /// let retries = vec![120, 240, 480];
    /// pool.logger("net").warn().obj("backoff_ms", &retries).log();
    /// ```
    pub fn obj<'v, T: Serialize + ?Sized + 'v>(
        mut self,
        key: &str,
        value: impl Into<Option<&'v T>>,
    ) -> Self {
        self.appender.obj_field(key, value.into());
        self
    }

    /// Any `Display` value, written as an escaped string.
    pub fn any(mut self, key: &str, value: &dyn fmt::Display) -> Self {
        self.appender.display_field(key, value);
        self
    }

    /// Bytes, base64 encoded.
    pub fn binary<'v>(mut self, key: &str, value: impl Into<Option<&'v [u8]>>) -> Self {
        self.appender.binary_field(key, value.into());
        self
    }

    /// The error's message under `@err`.
    pub fn err<E: StdError + ?Sized>(self, err: &E) -> Self {
        self.err_k("@err", err)
    }

    /// The error's message under a caller-chosen key.
    pub fn err_k<E: StdError + ?Sized>(mut self, key: &str, err: &E) -> Self {
        self.appender.display_field(key, &format_args!("{}", err));
        self
    }

    /// Adds a ULID in its 26-character text form.
    pub fn ulid(mut self, key: &str, value: impl Into<Option<Ulid>>) -> Self {
        self.appender.ulid_field(key, value.into());
        self
    }

    /// Free-form context under `@ctx`.
    pub fn ctx(mut self, value: &str) -> Self {
        self.appender.str_field("@ctx", Some(value));
        self
    }

    /// Source location under `@src`; see [`src!`](crate::src).
    pub fn src(mut self, src: Src) -> Self {
        self.appender.src("@src", &src);
        self
    }

    /// The human-readable message under `@msg`.
    pub fn msg(mut self, value: &str) -> Self {
        self.appender.str_field("@msg", Some(value));
        self
    }

    /// The owning logger's name under `@name`.
    pub fn name(mut self) -> Self {
        self.appender.name_field("@name");
        self
    }

    /// Distributed trace id under `@trace`.
    pub fn trace(mut self, id: &str) -> Self {
        self.appender.str_field("@trace", Some(id));
        self
    }

    /// Span id under `@span`.
    pub fn span(mut self, id: &str) -> Self {
        self.appender.str_field("@span", Some(id));
        self
    }

    /// Writes the line and hands the entry back to its pool.
    ///
    /// Entries with no fields write nothing. Write failures are reported
    /// through the `log` facade and the line is dropped.
    pub fn log(mut self) {
        let Some(home) = self.home else {
            return;
        };
        if let Some(line) = self.appender.finish() {
            if let Err(err) = home.sink().write_line(line) {
                log::warn!(target: "pool_logger", "dropped log line from {:?}: {}", home.name(), err);
            }
        }
    }
}

impl Drop for Entry<'_> {
    fn drop(&mut self) {
        if let Some(home) = self.home.take() {
            let appender = std::mem::replace(&mut self.appender, Appender::Noop);
            home.release(appender);
        }
    }
}

impl fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("level", &self.level())
            .field("logger", &self.home.map(Logger::name))
            .finish()
    }
}
