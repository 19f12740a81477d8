//! Error handling for Tydex parsing operations.
//!
//! Every parse failure carries a [`SourceLocation`] so callers can point
//! at the offending file and line. Parsing is all-or-nothing: any of these
//! errors means no document was produced.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where in the input an error was detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// File the text came from, if it was read from disk
    pub path: Option<PathBuf>,
    /// 1-based line number (0 when the error is not tied to a line)
    pub line: usize,
}

impl SourceLocation {
    pub fn new(path: Option<PathBuf>, line: usize) -> Self {
        Self { path, line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.line) {
            (Some(path), 0) => write!(f, "{}", path.display()),
            (Some(path), line) => write!(f, "{}:{}", path.display(), line),
            (None, 0) => write!(f, "<input>"),
            (None, line) => write!(f, "line {}", line),
        }
    }
}

#[derive(Error, Debug)]
pub enum TydexError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoding error at {location}: {reason}")]
    Encoding {
        location: SourceLocation,
        reason: String,
    },

    #[error("Unknown section '{keyword}' at {location}")]
    UnknownSection {
        location: SourceLocation,
        keyword: String,
    },

    #[error("Truncated file at {location}: end of input inside {section} section")]
    TruncatedFile {
        location: SourceLocation,
        section: String,
    },

    #[error("Malformed field at {location}: expected {expected}, found '{raw}'")]
    MalformedField {
        location: SourceLocation,
        raw: String,
        expected: String,
    },

    #[error("Validation failed at {location}: {reason}")]
    Validation {
        location: SourceLocation,
        reason: String,
    },

    #[error("Unknown channel: {name}")]
    UnknownChannel { name: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl TydexError {
    /// Location of the failure, for errors that are tied to the input text
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Encoding { location, .. }
            | Self::UnknownSection { location, .. }
            | Self::TruncatedFile { location, .. }
            | Self::MalformedField { location, .. }
            | Self::Validation { location, .. } => Some(location),
            Self::Io { .. } | Self::UnknownChannel { .. } | Self::Configuration { .. } => None,
        }
    }

    /// Line number of the failure, if any
    pub fn line(&self) -> Option<usize> {
        self.location().map(|location| location.line)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TydexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let with_path = SourceLocation::new(Some(PathBuf::from("run1.tdx")), 12);
        assert_eq!(with_path.to_string(), "run1.tdx:12");

        let without_path = SourceLocation::new(None, 7);
        assert_eq!(without_path.to_string(), "line 7");

        assert_eq!(SourceLocation::new(None, 0).to_string(), "<input>");
    }

    #[test]
    fn test_error_line_accessor() {
        let error = TydexError::MalformedField {
            location: SourceLocation::new(None, 42),
            raw: "abc".to_string(),
            expected: "float".to_string(),
        };
        assert_eq!(error.line(), Some(42));
        assert!(error.to_string().contains("line 42"));

        let error = TydexError::UnknownChannel {
            name: "FX".to_string(),
        };
        assert_eq!(error.line(), None);
    }
}
