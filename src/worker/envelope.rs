//! The structured record printed on stdout, and the writer that guarantees
//! something parseable always reaches the output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use url::Url;

const LAST_RESORT_RECORD: &str =
    r#"{"ok":false,"elapsed_ms":0,"error":"JSON encoding failed","data":null}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub url: Url,
    pub resolved_url: Url,
    pub final_url: Url,
    pub site: String,
    pub title: String,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub lang: Option<String>,
    pub text: String,
    pub fetched_at: DateTime<Utc>,
}

/// Success carries `data`, failure carries `error`; never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub ok: bool,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data: Option<ExtractedArticle>,
}

impl ResultEnvelope {
    pub fn success(article: ExtractedArticle, elapsed_ms: u64) -> Self {
        Self {
            ok: true,
            elapsed_ms,
            error: None,
            data: Some(article),
        }
    }

    pub fn failure(error: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            ok: false,
            elapsed_ms,
            error: Some(error.into()),
            data: None,
        }
    }
}

/// How the record is encoded on the way out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Escape every non-ASCII character as `\uXXXX`.
    pub ascii_only: bool,
}

/// Write one JSON line. Falls back to ASCII escaping, then to a fixed
/// failure record; never returns an error. Each attempt is a single
/// `write_all` of the complete line, and once any byte of an attempt has
/// been accepted no further attempt is made, so a half-written line is
/// never followed by a second record.
pub fn write_envelope<W: Write>(out: &mut W, envelope: &ResultEnvelope, config: OutputConfig) {
    let encoded = match serde_json::to_string(envelope) {
        Ok(json) => json,
        Err(_) => {
            let _ = write_line(out, LAST_RESORT_RECORD);
            return;
        }
    };

    let mut attempts = Vec::with_capacity(3);
    if !config.ascii_only {
        attempts.push(encoded.clone());
    }
    attempts.push(escape_non_ascii(&encoded));
    attempts.push(LAST_RESORT_RECORD.to_string());

    for line in &attempts {
        match write_line(out, line) {
            Ok(()) => return,
            Err(accepted) if accepted > 0 => return,
            Err(_) => {}
        }
    }
}

/// Write `line` plus a newline in one call. On failure, reports how many
/// bytes the writer had already taken.
fn write_line<W: Write>(out: &mut W, line: &str) -> Result<(), usize> {
    let mut buffer = Vec::with_capacity(line.len() + 1);
    buffer.extend_from_slice(line.as_bytes());
    buffer.push(b'\n');

    let mut tally = Tally {
        inner: out,
        accepted: 0,
    };
    tally
        .write_all(&buffer)
        .and_then(|()| tally.flush())
        .map_err(|_| tally.accepted)
}

struct Tally<'a, W> {
    inner: &'a mut W,
    accepted: usize,
}

impl<W: Write> Write for Tally<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.accepted += n;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Non-ASCII only ever appears inside JSON strings, so `\u` escapes (with
/// surrogate pairs above the BMP) keep the document valid.
pub fn escape_non_ascii(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() {
            escaped.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io;

    fn article() -> ExtractedArticle {
        let url = Url::parse("https://example.com/story").unwrap();
        ExtractedArticle {
            url: url.clone(),
            resolved_url: url.clone(),
            final_url: url,
            site: "example.com".to_string(),
            title: "Café ☕ 𝄞".to_string(),
            author: None,
            published_at: Some("2024-01-01".to_string()),
            lang: Some("fr".to_string()),
            text: "Texte".to_string(),
            fetched_at: Utc::now(),
        }
    }

    fn written(envelope: &ResultEnvelope, config: OutputConfig) -> String {
        let mut out = Vec::new();
        write_envelope(&mut out, envelope, config);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_success_shape() {
        let line = written(&ResultEnvelope::success(article(), 42), OutputConfig::default());
        let value: Value = serde_json::from_str(line.trim_end()).unwrap();

        assert_eq!(value["ok"], true);
        assert_eq!(value["elapsed_ms"], 42);
        assert!(value.get("error").is_none());
        assert_eq!(value["data"]["site"], "example.com");
        assert_eq!(value["data"]["author"], Value::Null);
        assert_eq!(value["data"]["title"], "Café ☕ 𝄞");
    }

    #[test]
    fn test_failure_shape() {
        let line = written(
            &ResultEnvelope::failure("Request timeout", 7),
            OutputConfig::default(),
        );
        let value: Value = serde_json::from_str(line.trim_end()).unwrap();

        assert_eq!(value["ok"], false);
        assert_eq!(value["elapsed_ms"], 7);
        assert_eq!(value["error"], "Request timeout");
        assert!(value.get("data").is_some());
        assert_eq!(value["data"], Value::Null);
    }

    #[test]
    fn test_ascii_only_output() {
        let line = written(
            &ResultEnvelope::success(article(), 1),
            OutputConfig { ascii_only: true },
        );
        assert!(line.is_ascii());
        assert!(line.contains(r"Caf\u00e9 \u2615 \ud834\udd1e"));

        let value: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["data"]["title"], "Café ☕ 𝄞");
    }

    /// Rejects any write containing non-ASCII bytes, then everything after
    /// `budget` writes.
    struct PickyWriter {
        accepted: Vec<u8>,
        budget: usize,
    }

    impl Write for PickyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 || !buf.is_ascii() {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "unencodable"));
            }
            self.budget -= 1;
            self.accepted.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_falls_back_to_ascii_when_write_fails() {
        let mut out = PickyWriter {
            accepted: Vec::new(),
            budget: usize::MAX,
        };
        write_envelope(
            &mut out,
            &ResultEnvelope::success(article(), 1),
            OutputConfig::default(),
        );

        let line = String::from_utf8(out.accepted).unwrap();
        assert!(line.is_ascii());
        let value: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_broken_output_never_panics() {
        let mut out = PickyWriter {
            accepted: Vec::new(),
            budget: 0,
        };
        write_envelope(
            &mut out,
            &ResultEnvelope::failure("boom", 1),
            OutputConfig::default(),
        );
        assert!(out.accepted.is_empty());
    }

    /// Takes at most `chunk` bytes per call and fails on the second call.
    struct ShortWriter {
        accepted: Vec<u8>,
        chunk: usize,
        calls: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls > 1 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            let n = buf.len().min(self.chunk);
            self.accepted.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_partial_write_is_not_followed_by_fallback() {
        let mut out = ShortWriter {
            accepted: Vec::new(),
            chunk: 8,
            calls: 0,
        };
        write_envelope(
            &mut out,
            &ResultEnvelope::success(article(), 1),
            OutputConfig::default(),
        );

        assert_eq!(out.accepted.len(), 8);
        assert_eq!(out.calls, 2);
        assert_eq!(out.accepted, br#"{"ok":tr"#.to_vec());
    }

    #[test]
    fn test_line_is_written_in_one_call() {
        let mut out = ShortWriter {
            accepted: Vec::new(),
            chunk: usize::MAX,
            calls: 0,
        };
        write_envelope(
            &mut out,
            &ResultEnvelope::failure("boom", 1),
            OutputConfig::default(),
        );

        assert_eq!(out.calls, 1);
        let line = String::from_utf8(out.accepted).unwrap();
        assert!(line.ends_with('\n'));
        let value: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["error"], "boom");
    }

    #[test]
    fn test_last_resort_record_is_valid_json() {
        let value: Value = serde_json::from_str(LAST_RESORT_RECORD).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["data"], Value::Null);
    }
}
