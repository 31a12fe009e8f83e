//! Log redaction for measurement values.
//!
//! Health measurements must not reach log sinks. Callers avoid logging them,
//! and [`RedactingMakeWriter`] masks any `field=value` or `field: value` pair
//! naming one of the input fields (canonical name or training column, any
//! case, optionally quoted as in JSON) before a line is written.

use std::sync::OnceLock;

use regex::Regex;
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::{Field, SLEEP_DURATION_SQRT_COLUMN};

pub const REDACTED: &str = "[REDACTED]";

/// Longest line kept. Bytes past this point are dropped up to the next
/// `\n` and the line is marked with [`TRUNCATED`].
const MAX_LINE_BYTES: usize = 16 * 1024;

pub const TRUNCATED: &str = " [TRUNCATED]";

static FIELD_VALUE: OnceLock<Option<Regex>> = OnceLock::new();

fn field_value_pattern() -> Option<&'static Regex> {
    FIELD_VALUE
        .get_or_init(|| {
            let mut keys: Vec<&str> = Field::ALL
                .iter()
                .flat_map(|f| [f.name(), f.column()])
                .chain([SLEEP_DURATION_SQRT_COLUMN])
                .collect();
            // Longest first so "Sleep Duration Sqrt" wins over "Sleep Duration".
            keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
            keys.dedup();

            let alternation = keys
                .iter()
                .map(|k| regex::escape(k).replace(' ', r"[ _]"))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(
                r#"(?i)(?P<key>"?\b(?:{alternation})\b"?\s*[:=]\s*)(?P<value>"[^"]*"|[^\s,;}}\]]+)"#
            ))
            .ok()
        })
        .as_ref()
}

/// Replace every input-field value in `line` with [`REDACTED`].
///
/// If the pattern cannot be built the whole line is replaced.
#[must_use]
pub fn redact(line: &str) -> String {
    match field_value_pattern() {
        Some(re) => re.replace_all(line, format!("${{key}}{REDACTED}")).into_owned(),
        None => {
            let mut out = REDACTED.to_string();
            if line.ends_with('\n') {
                out.push('\n');
            }
            out
        }
    }
}

/// `tracing_subscriber` writer that redacts each formatted line before it
/// reaches the wrapped sink.
#[derive(Debug, Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
}

impl<M> RedactingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct RedactingWriter<W: std::io::Write> {
    inner: W,
    /// The current line, without its `\n`.
    buffer: Vec<u8>,
    truncated: bool,
}

impl<W: std::io::Write> RedactingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            truncated: false,
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        if self.truncated {
            return;
        }
        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() > MAX_LINE_BYTES {
            // Cut on a char boundary so the kept prefix stays valid UTF-8.
            let mut end = MAX_LINE_BYTES;
            while end > 0 && (self.buffer[end] & 0xC0) == 0x80 {
                end -= 1;
            }
            self.buffer.truncate(end);
            self.truncated = true;
        }
    }

    /// Redact and write the buffered line as a whole.
    fn end_line(&mut self, newline: bool) -> std::io::Result<()> {
        let line = std::mem::take(&mut self.buffer);
        let mut out = redact(&String::from_utf8_lossy(&line));
        if std::mem::take(&mut self.truncated) {
            out.push_str(TRUNCATED);
        }
        if newline {
            out.push('\n');
        }
        self.inner.write_all(out.as_bytes())
    }
}

impl<W: std::io::Write> std::io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for segment in buf.split_inclusive(|&b| b == b'\n') {
            match segment.strip_suffix(b"\n") {
                Some(line) => {
                    self.push(line);
                    self.end_line(true)?;
                }
                None => self.push(segment),
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.buffer.is_empty() || self.truncated {
            self.end_line(false)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for RedactingWriter<W> {
    fn drop(&mut self) {
        // The fmt layer drops its writer after each event.
        let _ = std::io::Write::flush(self);
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Sink {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().expect("lock").clone()).expect("utf8")
        }
    }

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Sink {
        type Writer = Sink;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_redacts_key_value_pairs() {
        let out = redact("analysing Age=35 SystolicBP=128 heart_rate=70");
        assert_eq!(out, "analysing Age=[REDACTED] SystolicBP=[REDACTED] heart_rate=[REDACTED]");
    }

    #[test]
    fn test_redacts_json_and_column_names() {
        let out = redact(r#"{"Gender": "Male", "Quality of Sleep": 7, "Daily Steps":8000}"#);
        assert!(!out.contains("Male"));
        assert!(!out.contains('7'));
        assert!(!out.contains("8000"));
        assert_eq!(out.matches(REDACTED).count(), 3);
    }

    #[test]
    fn test_longest_column_wins() {
        let out = redact("Sleep Duration Sqrt: 2.64 Sleep Duration: 7");
        assert_eq!(out, "Sleep Duration Sqrt: [REDACTED] Sleep Duration: [REDACTED]");
    }

    #[test]
    fn test_leaves_other_text_alone() {
        let line = "artifacts loaded features=22 trees=3 stage=inference";
        assert_eq!(redact(line), line);
        // A field name without a value is not touched.
        assert_eq!(redact("validation failed field=Age"), "validation failed field=Age");
    }

    #[test]
    fn test_writer_redacts_per_line() {
        let sink = Sink::default();
        let make = RedactingMakeWriter::new(sink.clone());
        {
            let mut w = make.make_writer();
            w.write_all(b"first Age=4").expect("write");
            w.write_all(b"0\nsecond StressLevel=9\ntrailing").expect("write");
            w.flush().expect("flush");
        }
        assert_eq!(
            sink.contents(),
            "first Age=[REDACTED]\nsecond StressLevel=[REDACTED]\ntrailing"
        );
    }

    #[test]
    fn test_writer_flushes_on_drop() {
        let sink = Sink::default();
        let make = RedactingMakeWriter::new(sink.clone());
        {
            let mut w = make.make_writer();
            w.write_all(b"DailySteps=12000").expect("write");
        }
        assert_eq!(sink.contents(), "DailySteps=[REDACTED]");
    }

    #[test]
    fn test_overlong_line_is_redacted_whole_then_truncated() {
        let sink = Sink::default();
        let make = RedactingMakeWriter::new(sink.clone());
        let mut line = b"Age=".to_vec();
        line.extend(std::iter::repeat(b'7').take(20_000));
        line.extend_from_slice(b"\nStressLevel=4\n");
        {
            let mut w = make.make_writer();
            for chunk in line.chunks(1000) {
                w.write_all(chunk).expect("write");
            }
        }
        let out = sink.contents();
        assert_eq!(out, "Age=[REDACTED] [TRUNCATED]\nStressLevel=[REDACTED]\n");
        assert!(!out.contains('7'));
    }

    #[test]
    fn test_truncation_keeps_utf8_intact() {
        let sink = Sink::default();
        let make = RedactingMakeWriter::new(sink.clone());
        let mut line = "x".repeat(MAX_LINE_BYTES - 1);
        line.push_str("é\n");
        {
            let mut w = make.make_writer();
            w.write_all(line.as_bytes()).expect("write");
        }
        let out = sink.contents();
        assert!(!out.contains('\u{FFFD}'));
        assert_eq!(out, format!("{}{TRUNCATED}\n", "x".repeat(MAX_LINE_BYTES - 1)));
    }
}
