use std::fmt::Display;
use std::io::Write;
use std::sync::Arc;

use serde::Serialize;

use super::{escape_display, quote_into, write_rfc3339, Encode, Precision};
use crate::entry::Src;
use crate::level::Level;

/// Renders one record as a JSON object:
///
/// `{"@ts":"2024-01-15T14:30:45.123456789Z","@lvl":"info","key":"value"}`
pub(crate) struct JsonAppender {
    buf: Vec<u8>,
    fields_start: usize,
    level: Level,
    name: Arc<str>,
}

impl JsonAppender {
    pub(crate) fn new(buf: Vec<u8>, level: Level, name: Arc<str>) -> Self {
        Self { buf, fields_start: 0, level, name }
    }

    pub(crate) fn level(&self) -> Level {
        self.level
    }

    fn quoted(&mut self, value: &str) {
        quote_into(&mut self.buf, value);
    }
}

impl Encode for JsonAppender {
    const TERMINATOR: &'static [u8] = b"}\n";

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
        self.buf.extend_from_slice(b"{\"@ts\":\"");
        write_rfc3339(&mut self.buf, nanos, Precision::Nanos);
        self.buf.extend_from_slice(b"\",\"@lvl\":\"");
        self.buf.extend_from_slice(self.level.as_str().as_bytes());
        self.buf.extend_from_slice(b"\",");
        self.fields_start = self.buf.len();
    }

    fn key(&mut self, key: &str) {
        self.quoted(key);
        self.buf.push(b':');
    }

    fn end_field(&mut self) {
        self.buf.push(b',');
    }

    fn string(&mut self, value: &str) {
        self.quoted(value);
    }

    fn display(&mut self, value: &dyn Display) {
        self.buf.push(b'"');
        escape_display(&mut self.buf, value);
        self.buf.push(b'"');
    }

    fn non_finite(&mut self, _value: f64) {
        self.buf.extend_from_slice(b"null");
    }

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> serde_json::Result<()> {
        serde_json::to_writer(&mut self.buf, value)
    }

    fn src(&mut self, key: &str, src: &Src) {
        self.key(key);
        self.buf.extend_from_slice(b"{\"file\":");
        self.quoted(src.file);
        self.buf.extend_from_slice(b",\"fn\":");
        self.quoted(src.function);
        let _ = write!(self.buf, ",\"line\":{}}}", src.line);
        self.end_field();
    }
}
