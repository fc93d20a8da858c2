use std::fmt::Display;
use std::io::Write;
use std::sync::Arc;

use serde::Serialize;

use super::{escape_display, escape_into, thread_tag, write_rfc3339, Encode, Precision};
use crate::entry::Src;
use crate::level::Level;

/// Renders one record as a human-readable line:
///
/// `2024-01-15T14:30:45.123456Z INFO  [http                                (00000003)]: method=GET path=/`
///
/// Keys and values are written bare when they are non-empty and contain no
/// space, `=`, quote, or character needing escaping; otherwise they are
/// quoted with JSON escaping.
pub(crate) struct TextAppender {
    buf: Vec<u8>,
    fields_start: usize,
    level: Level,
    name: Arc<str>,
    // Reused for `obj` values, which must be inspected before quoting.
    scratch: Vec<u8>,
}

impl TextAppender {
    pub(crate) fn new(buf: Vec<u8>, level: Level, name: Arc<str>) -> Self {
        Self { buf, fields_start: 0, level, name, scratch: Vec::new() }
    }

    pub(crate) fn level(&self) -> Level {
        self.level
    }

    /// Runs `write` (which must emit escaped text) and quotes the result if
    /// it cannot stand bare.
    fn value(&mut self, write: impl FnOnce(&mut Vec<u8>)) {
        let start = self.buf.len();
        write(&mut self.buf);
        let written = &self.buf[start..];
        let needs_quotes =
            written.is_empty() || written.iter().any(|b| matches!(b, b' ' | b'=' | b'"' | b'\\'));
        if needs_quotes {
            self.buf.insert(start, b'"');
            self.buf.push(b'"');
        }
    }
}

impl Encode for TextAppender {
    const TERMINATOR: &'static [u8] = b"\n";

    fn buf(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    fn fields_start(&self) -> usize {
        self.fields_start
    }

    fn logger_name(&self) -> Arc<str> {
        self.name.clone()
    }

    fn begin(&mut self, nanos: i64) {
        self.buf.clear();
        write_rfc3339(&mut self.buf, nanos, Precision::Micros);
        let _ = write!(
            self.buf,
            " {:<5} [{:<35} ({:08})]: ",
            self.level.as_upper_str(),
            self.name,
            thread_tag()
        );
        self.fields_start = self.buf.len();
    }

    // Keys follow the same bare-or-quoted rule as values.
    fn key(&mut self, key: &str) {
        self.value(|buf| escape_into(buf, key));
        self.buf.push(b'=');
    }

    fn end_field(&mut self) {
        self.buf.push(b' ');
    }

    fn string(&mut self, value: &str) {
        self.value(|buf| escape_into(buf, value));
    }

    fn display(&mut self, value: &dyn Display) {
        self.value(|buf| escape_display(buf, value));
    }

    fn non_finite(&mut self, value: f64) {
        let _ = write!(self.buf, "{}", value);
    }

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> serde_json::Result<()> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        let result = serde_json::to_writer(&mut scratch, value);
        if result.is_ok() {
            // serde_json only ever emits UTF-8.
            if let Ok(rendered) = std::str::from_utf8(&scratch) {
                self.string(rendered);
            }
        }
        self.scratch = scratch;
        result
    }

    fn src(&mut self, key: &str, src: &Src) {
        let _ = write!(self.buf, "{}.file=", key);
        self.string(src.file);
        self.end_field();
        let _ = write!(self.buf, "{}.fn=", key);
        self.string(src.function);
        self.end_field();
        let _ = write!(self.buf, "{}.line={}", key, src.line);
        self.end_field();
    }
}
