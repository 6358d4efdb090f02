use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

pub const MAX_FIELD_LEN: usize = 128;

const ELLIPSIS: &str = "...";

// joins a base url and a wordlist entry with exactly one '/' between them
pub fn format_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let mut out = String::with_capacity(base.len() + path.len() + 1);
    out.push_str(base);
    out.push('/');
    out.push_str(path);
    out
}

/// Shortens `s` to at most `max_len` characters, replacing the tail with `...`
/// when it had to cut. Counts chars rather than bytes so multi-byte titles are
/// never split mid code point.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn clean_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let line = line.as_ref().trim();
            if line.is_empty() {
                None
            } else {
                Some(line.to_string())
            }
        })
        .collect()
}

/// Reads a newline-delimited file, trimming every line and skipping blanks.
/// Lines are decoded lossily, so a stray latin-1 byte in a wordlist costs one
/// replacement character instead of the whole file.
pub async fn read_lines(path: &str) -> Result<Vec<String>, ReadLinesError> {
    let handle = File::open(path).await.map_err(ReadLinesError::Open)?;
    let mut reader = BufReader::new(handle);
    let mut out = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(ReadLinesError::Read)?;
        if read == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if !line.is_empty() {
            out.push(line.to_string());
        }
    }
    Ok(out)
}

#[derive(Debug, thiserror::Error)]
pub enum ReadLinesError {
    #[error("cannot open file: {0}")]
    Open(#[source] std::io::Error),
    #[error("cannot read file: {0}")]
    Read(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_url_collapses_separators() {
        assert_eq!(format_url("http://a.com/", "/x"), "http://a.com/x");
        assert_eq!(format_url("http://a.com", "x"), "http://a.com/x");
        assert_eq!(format_url("http://a.com/", "x"), "http://a.com/x");
        assert_eq!(format_url("http://a.com///", "//x/y"), "http://a.com/x/y");
    }

    #[test]
    fn truncate_long_value() {
        let title = "a".repeat(200);
        let out = truncate_string(&title, MAX_FIELD_LEN);
        assert_eq!(out.chars().count(), MAX_FIELD_LEN);
        assert!(out.ends_with("..."));
        assert!(out.starts_with(&"a".repeat(125)));
    }

    #[test]
    fn truncate_short_value_is_unchanged() {
        let title = "b".repeat(50);
        assert_eq!(truncate_string(&title, MAX_FIELD_LEN), title);
        let exact = "c".repeat(MAX_FIELD_LEN);
        assert_eq!(truncate_string(&exact, MAX_FIELD_LEN), exact);
    }

    #[test]
    fn truncate_respects_multibyte_chars() {
        let title = "é".repeat(130);
        let out = truncate_string(&title, MAX_FIELD_LEN);
        assert_eq!(out.chars().count(), MAX_FIELD_LEN);
    }

    #[test]
    fn clean_lines_drops_blank_and_trims() {
        let out = clean_lines(["admin", "", "  login  ", "backup"]);
        assert_eq!(out, vec!["admin", "login", "backup"]);
    }

    #[tokio::test]
    async fn read_lines_skips_whitespace_only_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "admin\n\n  login  \n\t\nbackup\n").unwrap();
        let out = read_lines(path.to_str().unwrap()).await.unwrap();
        assert_eq!(out, vec!["admin", "login", "backup"]);
    }

    #[tokio::test]
    async fn read_lines_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        let err = read_lines(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, ReadLinesError::Open(_)));
    }

    #[tokio::test]
    async fn read_lines_keeps_lines_that_are_not_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        std::fs::write(&path, b"admin\ncaf\xe9\r\nbackup\n").unwrap();
        let out = read_lines(path.to_str().unwrap()).await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], "admin");
        assert_eq!(out[1], "caf\u{fffd}");
        assert_eq!(out[2], "backup");
    }

    #[test]
    fn read_lines_error_messages() {
        let err = ReadLinesError::Open(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.to_string().starts_with("cannot open file: "));
        assert!(std::error::Error::source(&err).is_some());
    }
}
