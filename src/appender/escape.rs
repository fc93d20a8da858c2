use std::fmt;

/// Appends `value` to `buf` with JSON string escaping, without quotes.
pub(crate) fn escape_into(buf: &mut Vec<u8>, value: &str) {
    let start = buf.len();
    // Serializing a str into a Vec cannot fail.
    if serde_json::to_writer(&mut *buf, value).is_err() {
        buf.truncate(start);
        return;
    }
    // Drop the surrounding quotes serde_json wrote.
    buf.pop();
    buf.copy_within(start + 1.., start);
    buf.pop();
}

/// Appends `value` to `buf` as a quoted JSON string.
pub(crate) fn quote_into(buf: &mut Vec<u8>, value: &str) {
    let start = buf.len();
    if serde_json::to_writer(&mut *buf, value).is_err() {
        buf.truncate(start);
        buf.extend_from_slice(b"\"\"");
    }
}

/// `fmt::Write` adapter that escapes everything written through it.
struct Escaper<'a>(&'a mut Vec<u8>);

impl fmt::Write for Escaper<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        escape_into(self.0, s);
        Ok(())
    }
}

/// Formats `value` straight into `buf`, escaped, with no intermediate String.
pub(crate) fn escape_display(buf: &mut Vec<u8>, value: &dyn fmt::Display) {
    // A failing Display impl leaves whatever it managed to write.
    let _ = fmt::Write::write_fmt(&mut Escaper(buf), format_args!("{}", value));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(s: &str) -> String {
        let mut buf = Vec::new();
        escape_into(&mut buf, s);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(escaped("hello world"), "hello world");
        assert_eq!(escaped("héllo ✓"), "héllo ✓");
    }

    #[test]
    fn test_quotes_and_backslashes() {
        assert_eq!(escaped(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escaped(r"C:\tmp"), r"C:\\tmp");
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(escaped("a\nb\tc\r"), "a\\nb\\tc\\r");
        assert_eq!(escaped("\u{1}"), "\\u0001");
        assert_eq!(escaped("\u{1f}x"), "\\u001fx");
        assert_eq!(escaped("\u{8}\u{c}"), "\\b\\f");
    }

    #[test]
    fn test_quoted() {
        let mut buf = Vec::new();
        quote_into(&mut buf, "a\"b");
        assert_eq!(buf, br#""a\"b""#);
    }

    #[test]
    fn test_appends_after_existing_content() {
        let mut buf = b"k=".to_vec();
        escape_into(&mut buf, "\u{7}x");
        assert_eq!(buf, b"k=\\u0007x");
    }

    #[test]
    fn test_display_is_escaped() {
        let mut buf = Vec::new();
        escape_display(&mut buf, &format_args!("{}\"{}", 1, "\n"));
        assert_eq!(buf, b"1\\\"\\n");
    }
}
