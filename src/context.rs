//! Transient state of a single parse.

use crate::error::{Result, SourceLocation, TydexError};
use crate::sections::SectionState;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parse state owned by one parse call and dropped when it returns
#[derive(Debug)]
pub struct ParseContext {
    source: Option<PathBuf>,
    state: SectionState,
    line: usize,
    issues: Vec<TydexError>,
}

impl ParseContext {
    pub fn new(source: Option<&Path>) -> Self {
        Self {
            source: source.map(Path::to_path_buf),
            state: SectionState::Start,
            line: 0,
            issues: Vec::new(),
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub fn set_state(&mut self, state: SectionState) {
        debug!("Section {} -> {} at line {}", self.state, state, self.line);
        self.state = state;
    }

    /// Last line number the parser looked at
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn advance_to(&mut self, line: usize) {
        self.line = line;
    }

    /// Location of the given line in this input
    pub fn location(&self, line: usize) -> SourceLocation {
        SourceLocation::new(self.source.clone(), line)
    }

    /// Location of the current line
    pub fn here(&self) -> SourceLocation {
        self.location(self.line)
    }

    /// Record a problem and keep going
    pub fn record(&mut self, issue: TydexError) {
        debug!("Recorded parse issue: {}", issue);
        self.issues.push(issue);
    }

    /// Record the error of a fallible step, returning its value on success
    pub fn check<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(issue) => {
                self.record(issue);
                None
            }
        }
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Fail with the first recorded issue, if any
    pub fn finish(self) -> Result<()> {
        let mut issues = self.issues.into_iter();
        match issues.next() {
            None => Ok(()),
            Some(first) => {
                let remaining = issues.len();
                if remaining > 0 {
                    debug!("{} further parse issues after: {}", remaining, first);
                    for issue in issues {
                        debug!("  {}", issue);
                    }
                }
                Err(first)
            }
        }
    }
}
