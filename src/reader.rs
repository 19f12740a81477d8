//! Line reading for Tydex input.
//!
//! Decodes the input once and hands out restartable iterators of logical
//! lines: blank lines and comment lines are dropped, trailing whitespace is
//! removed, and each line keeps its 1-based number for error reporting.
//! Leading whitespace is kept on [`LogicalLine::raw`] because item lines are
//! fixed-column.

use crate::config::{Encoding, ParserConfig};
use crate::error::{Result, SourceLocation, TydexError};
use std::iter::Enumerate;
use std::path::{Path, PathBuf};
use std::str::Lines;
use tracing::debug;

const UTF8_BOM: char = '\u{feff}';

/// A non-blank, non-comment line of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalLine<'a> {
    /// 1-based line number in the original input
    pub number: usize,
    /// Line with trailing whitespace removed
    pub raw: &'a str,
    /// Line with surrounding whitespace removed
    pub text: &'a str,
}

/// Decoded Tydex input
#[derive(Debug, Clone)]
pub struct LineReader {
    text: String,
    path: Option<PathBuf>,
    comment_prefix: char,
}

impl LineReader {
    /// Read and decode a file. The file is closed before this returns.
    pub fn from_path(path: &Path, config: &ParserConfig) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| TydexError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        Self::from_bytes(&bytes, Some(path.to_path_buf()), config)
    }

    /// Decode raw bytes under the configured encoding
    pub fn from_bytes(bytes: &[u8], path: Option<PathBuf>, config: &ParserConfig) -> Result<Self> {
        let text = match config.encoding {
            Encoding::Utf8 => match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(e) => {
                    let valid = &bytes[..e.valid_up_to()];
                    let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
                    return Err(TydexError::Encoding {
                        location: SourceLocation::new(path, line),
                        reason: format!(
                            "invalid UTF-8 sequence at byte offset {}",
                            e.valid_up_to()
                        ),
                    });
                }
            },
            Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        };

        Ok(Self::with_path(text, path, config))
    }

    /// Wrap text that is already decoded
    pub fn from_text(text: impl Into<String>, config: &ParserConfig) -> Self {
        Self::with_path(text.into(), None, config)
    }

    fn with_path(mut text: String, path: Option<PathBuf>, config: &ParserConfig) -> Self {
        if text.starts_with(UTF8_BOM) {
            text.replace_range(..UTF8_BOM.len_utf8(), "");
        }

        Self {
            text,
            path,
            comment_prefix: config.comment_prefix,
        }
    }

    /// Path the input was read from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Iterate logical lines from the start of the input
    pub fn lines(&self) -> LogicalLines<'_> {
        LogicalLines {
            inner: self.text.lines().enumerate(),
            comment_prefix: self.comment_prefix,
        }
    }
}

/// Iterator over the logical lines of a [`LineReader`]
#[derive(Debug, Clone)]
pub struct LogicalLines<'a> {
    inner: Enumerate<Lines<'a>>,
    comment_prefix: char,
}

impl<'a> Iterator for LogicalLines<'a> {
    type Item = LogicalLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, line) in self.inner.by_ref() {
            let text = line.trim();
            if text.is_empty() || text.starts_with(self.comment_prefix) {
                continue;
            }

            return Some(LogicalLine {
                number: index + 1,
                raw: line.trim_end(),
                text,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let reader = LineReader::from_text(
            "**HEADER\n\n! a comment\n   ! indented comment\nDATE      x\n",
            &ParserConfig::default(),
        );

        let lines: Vec<_> = reader.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[0].text, "**HEADER");
        assert_eq!(lines[1].number, 5);
        assert_eq!(lines[1].text, "DATE      x");
    }

    #[test]
    fn test_raw_keeps_leading_whitespace() {
        let reader = LineReader::from_text("   1.0  2.0   \r\n", &ParserConfig::default());
        let line = reader.lines().next().unwrap();
        assert_eq!(line.raw, "   1.0  2.0");
        assert_eq!(line.text, "1.0  2.0");
    }

    #[test]
    fn test_lines_are_restartable() {
        let reader = LineReader::from_text("a\nb\nc", &ParserConfig::default());
        assert_eq!(reader.lines().count(), 3);
        assert_eq!(reader.lines().count(), 3);
    }

    #[test]
    fn test_strips_bom() {
        let reader = LineReader::from_text("\u{feff}**HEADER", &ParserConfig::default());
        assert_eq!(reader.lines().next().unwrap().text, "**HEADER");
    }

    #[test]
    fn test_custom_comment_prefix() {
        let config = ParserConfig::default().with_comment_prefix('#');
        let reader = LineReader::from_text("# skipped\n! kept", &config);
        let lines: Vec<_> = reader.lines().map(|l| l.text).collect();
        assert_eq!(lines, vec!["! kept"]);
    }

    #[test]
    fn test_invalid_utf8_reports_line() {
        let bytes = b"**HEADER\nDATE      \xff\xfe\n";
        let result = LineReader::from_bytes(bytes, None, &ParserConfig::default());

        match result {
            Err(TydexError::Encoding { location, .. }) => assert_eq!(location.line, 2),
            other => panic!("expected encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_latin1_always_decodes() {
        let bytes = b"UNIT      Temperatur \xb0C\n";
        let config = ParserConfig::default().with_encoding(Encoding::Latin1);
        let reader = LineReader::from_bytes(bytes, None, &config).unwrap();
        assert_eq!(reader.lines().next().unwrap().text, "UNIT      Temperatur °C");
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = LineReader::from_path(
            Path::new("/nonexistent/run.tdx"),
            &ParserConfig::default(),
        );
        assert!(matches!(result, Err(TydexError::Io { .. })));
    }

    #[test]
    fn test_from_path_records_path() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "**HEADER").unwrap();

        let reader = LineReader::from_path(temp_file.path(), &ParserConfig::default()).unwrap();
        assert_eq!(reader.path(), Some(temp_file.path()));
        assert_eq!(reader.lines().count(), 1);
    }
}
