//! Format-specific record encoders.
//!
//! Every pooled entry owns one [`Appender`]. Field calls append
//! `key/value` fragments, each followed by the format's separator; `finish`
//! swaps the trailing separator for the line terminator. The header is
//! written when the appender is (re)acquired, so a finished line is a single
//! contiguous slice and reaches the sink with one `write_all`.

use std::fmt::Display;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::display::Base64Display;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

use crate::config::Format;
use crate::entry::Src;
use crate::error::Error;
use crate::level::Level;
use crate::ulid::Ulid;

mod escape;
mod json;
mod text;

pub(crate) use escape::{escape_display, escape_into, quote_into};
pub(crate) use json::JsonAppender;
pub(crate) use text::TextAppender;

/// Radix for `intx` / `intb` fields.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Radix {
    Hex,
    Binary,
}

/// Encoding primitives a format has to supply. The field writers are built
/// on top of them and shared by both formats.
pub(crate) trait Encode {
    /// Replaces the trailing separator when a line is finished.
    const TERMINATOR: &'static [u8];

    fn buf(&mut self) -> &mut Vec<u8>;

    /// Length of the header; anything beyond it is a field.
    fn fields_start(&self) -> usize;

    fn logger_name(&self) -> Arc<str>;

    /// Clears the buffer and writes the header for a record taken at `nanos`.
    fn begin(&mut self, nanos: i64);

    /// Writes `key` and the key/value delimiter.
    fn key(&mut self, key: &str);

    fn end_field(&mut self);

    fn string(&mut self, value: &str);

    fn display(&mut self, value: &dyn Display);

    fn non_finite(&mut self, value: f64);

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> serde_json::Result<()>;

    fn src(&mut self, key: &str, src: &Src);

    fn null_field(&mut self, key: &str) {
        self.key(key);
        self.buf().extend_from_slice(b"null");
        self.end_field();
    }

    fn str_field(&mut self, key: &str, value: Option<&str>) {
        let Some(value) = value else {
            return self.null_field(key);
        };
        self.key(key);
        self.string(value);
        self.end_field();
    }

    fn display_field(&mut self, key: &str, value: &dyn Display) {
        self.key(key);
        self.display(value);
        self.end_field();
    }

    fn int_field(&mut self, key: &str, value: Option<i128>) {
        let Some(value) = value else {
            return self.null_field(key);
        };
        self.key(key);
        let _ = write!(self.buf(), "{}", value);
        self.end_field();
    }

    fn radix_field(&mut self, key: &str, value: Option<i128>, radix: Radix) {
        let Some(value) = value else {
            return self.null_field(key);
        };
        let sign = if value < 0 { "-" } else { "" };
        let magnitude = value.unsigned_abs();
        match radix {
            Radix::Hex => self.display_field(key, &format_args!("{}{:#x}", sign, magnitude)),
            Radix::Binary => self.display_field(key, &format_args!("{}{:#b}", sign, magnitude)),
        }
    }

    fn float_field(&mut self, key: &str, value: Option<f64>) {
        let Some(value) = value else {
            return self.null_field(key);
        };
        self.key(key);
        if value.is_finite() {
            let _ = write!(self.buf(), "{}", value);
        } else {
            self.non_finite(value);
        }
        self.end_field();
    }

    fn bool_field(&mut self, key: &str, value: Option<bool>) {
        let Some(value) = value else {
            return self.null_field(key);
        };
        self.key(key);
        let literal: &[u8] = if value { b"true" } else { b"false" };
        self.buf().extend_from_slice(literal);
        self.end_field();
    }

    fn binary_field(&mut self, key: &str, value: Option<&[u8]>) {
        let Some(value) = value else {
            return self.null_field(key);
        };
        self.display_field(key, &Base64Display::new(value, &STANDARD));
    }

    fn obj_field<T: Serialize + ?Sized>(&mut self, key: &str, value: Option<&T>) {
        let Some(value) = value else {
            return self.null_field(key);
        };
        self.key(key);
        let value_start = self.buf().len();
        if self.json(value).is_err() {
            let buf = self.buf();
            buf.truncate(value_start);
            buf.extend_from_slice(b"null");
        }
        self.end_field();
    }

    fn ulid_field(&mut self, key: &str, value: Option<Ulid>) {
        let Some(value) = value else {
            return self.null_field(key);
        };
        let encoded = value.encode();
        // The alphabet is ASCII, so this never fails.
        if let Ok(text) = std::str::from_utf8(&encoded) {
            self.str_field(key, Some(text));
        }
    }

    fn name_field(&mut self, key: &str) {
        let name = self.logger_name();
        self.str_field(key, Some(&*name));
    }

    /// Terminates the line. `None` when no field was written.
    fn finish(&mut self) -> Option<&[u8]> {
        let start = self.fields_start();
        let buf = self.buf();
        if buf.len() <= start {
            return None;
        }
        buf.pop();
        buf.extend_from_slice(Self::TERMINATOR);
        Some(buf.as_slice())
    }
}

/// The encoder state of one entry.
pub(crate) enum Appender {
    Json(JsonAppender),
    Text(TextAppender),
    Noop,
}

macro_rules! delegate {
    ($( fn $name:ident(&mut self $(, $arg:ident: $ty:ty)*); )*) => {
        $(
            pub(crate) fn $name(&mut self $(, $arg: $ty)*) {
                match self {
                    Appender::Json(a) => a.$name($($arg),*),
                    Appender::Text(a) => a.$name($($arg),*),
                    Appender::Noop => {}
                }
            }
        )*
    };
}

impl Appender {
    /// Builds an appender whose buffer holds `capacity` bytes up front.
    pub(crate) fn new(
        format: Format,
        level: Level,
        name: Arc<str>,
        capacity: usize,
    ) -> Result<Self, Error> {
        let mut buf = Vec::new();
        buf.try_reserve(capacity)?;
        Ok(match format {
            Format::Json => Appender::Json(JsonAppender::new(buf, level, name)),
            Format::Text => Appender::Text(TextAppender::new(buf, level, name)),
        })
    }

    pub(crate) fn level(&self) -> Level {
        match self {
            Appender::Json(a) => a.level(),
            Appender::Text(a) => a.level(),
            Appender::Noop => Level::None,
        }
    }

    pub(crate) fn is_noop(&self) -> bool {
        matches!(self, Appender::Noop)
    }

    delegate! {
        fn begin(&mut self, nanos: i64);
        fn str_field(&mut self, key: &str, value: Option<&str>);
        fn display_field(&mut self, key: &str, value: &dyn Display);
        fn int_field(&mut self, key: &str, value: Option<i128>);
        fn radix_field(&mut self, key: &str, value: Option<i128>, radix: Radix);
        fn float_field(&mut self, key: &str, value: Option<f64>);
        fn bool_field(&mut self, key: &str, value: Option<bool>);
        fn binary_field(&mut self, key: &str, value: Option<&[u8]>);
        fn ulid_field(&mut self, key: &str, value: Option<Ulid>);
        fn src(&mut self, key: &str, src: &Src);
        fn name_field(&mut self, key: &str);
    }

    pub(crate) fn obj_field<T: Serialize + ?Sized>(&mut self, key: &str, value: Option<&T>) {
        match self {
            Appender::Json(a) => a.obj_field(key, value),
            Appender::Text(a) => a.obj_field(key, value),
            Appender::Noop => {}
        }
    }

    pub(crate) fn finish(&mut self) -> Option<&[u8]> {
        match self {
            Appender::Json(a) => a.finish(),
            Appender::Text(a) => a.finish(),
            Appender::Noop => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Precision {
    Micros,
    Nanos,
}

/// Writes `nanos` since the epoch as an RFC3339 UTC timestamp.
///
/// Components are written one by one rather than through `DateTime::format`,
/// which renders into a temporary `String`.
pub(crate) fn write_rfc3339(buf: &mut Vec<u8>, nanos: i64, precision: Precision) {
    let secs = nanos.div_euclid(1_000_000_000);
    let subsec = nanos.rem_euclid(1_000_000_000) as u32;
    let Some(at) = DateTime::<Utc>::from_timestamp(secs, subsec) else {
        buf.extend_from_slice(b"1970-01-01T00:00:00Z");
        return;
    };
    let _ = write!(
        buf,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        at.year(),
        at.month(),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    );
    let _ = match precision {
        Precision::Micros => write!(buf, ".{:06}Z", at.nanosecond() / 1_000),
        Precision::Nanos => write!(buf, ".{:09}Z", at.nanosecond()),
    };
}

static NEXT_THREAD_TAG: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TAG: u64 = NEXT_THREAD_TAG.fetch_add(1, Ordering::Relaxed);
}

/// Small process-unique number for the calling thread, assigned on first use.
pub(crate) fn thread_tag() -> u64 {
    THREAD_TAG.with(|tag| *tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(nanos: i64, precision: Precision) -> String {
        let mut buf = Vec::new();
        write_rfc3339(&mut buf, nanos, precision);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_rfc3339_precision() {
        let nanos = 1_700_000_000_123_456_789;
        assert_eq!(rendered(nanos, Precision::Nanos), "2023-11-14T22:13:20.123456789Z");
        assert_eq!(rendered(nanos, Precision::Micros), "2023-11-14T22:13:20.123456Z");
        assert_eq!(rendered(0, Precision::Micros), "1970-01-01T00:00:00.000000Z");
        assert_eq!(rendered(i64::MAX, Precision::Nanos), "2262-04-11T23:47:16.854775807Z");
    }

    #[test]
    fn test_rfc3339_before_epoch() {
        assert_eq!(rendered(-1, Precision::Nanos), "1969-12-31T23:59:59.999999999Z");
    }

    #[test]
    fn test_thread_tags_differ() {
        let here = thread_tag();
        assert_eq!(here, thread_tag());
        let there = std::thread::spawn(thread_tag).join().unwrap();
        assert_ne!(here, there);
    }

    #[test]
    fn test_impossible_capacity_fails() {
        let result = Appender::new(Format::Json, Level::Info, Arc::from("x"), usize::MAX);
        assert!(matches!(result, Err(Error::Alloc(_))));
    }
}
