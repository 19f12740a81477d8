//! Section classification for Tydex files.
//!
//! Walks the logical lines once, tracking which `**KEYWORD` section is open,
//! and groups the content lines under their section. Structural problems
//! (unknown keywords, repeated sections, content outside any section, an
//! input that ends before its `**END` marker) are reported here, before any
//! field is parsed.

use crate::config::ParserConfig;
use crate::constants::{SECTION_PREFIX, keywords};
use crate::context::ParseContext;
use crate::error::{Result, TydexError};
use crate::reader::LogicalLine;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*\s*([A-Z][A-Z0-9_]*)\s*$").expect("section header pattern is valid")
});

/// A recognised Tydex section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    Comments,
    Constants,
    Channels,
    Data,
    End,
}

impl Section {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            keywords::HEADER => Some(Section::Header),
            keywords::COMMENTS => Some(Section::Comments),
            keywords::CONSTANTS => Some(Section::Constants),
            keywords::MEASURCHANNELS => Some(Section::Channels),
            keywords::MEASURDATA => Some(Section::Data),
            keywords::END => Some(Section::End),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Section::Header => keywords::HEADER,
            Section::Comments => keywords::COMMENTS,
            Section::Constants => keywords::CONSTANTS,
            Section::Channels => keywords::MEASURCHANNELS,
            Section::Data => keywords::MEASURDATA,
            Section::End => keywords::END,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SECTION_PREFIX, self.keyword())
    }
}

/// Classifier state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Start,
    Metadata,
    Comments,
    Constants,
    Channels,
    Data,
    End,
}

impl SectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SectionState::End)
    }
}

impl From<Section> for SectionState {
    fn from(section: Section) -> Self {
        match section {
            Section::Header => SectionState::Metadata,
            Section::Comments => SectionState::Comments,
            Section::Constants => SectionState::Constants,
            Section::Channels => SectionState::Channels,
            Section::Data => SectionState::Data,
            Section::End => SectionState::End,
        }
    }
}

impl fmt::Display for SectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionState::Start => "START",
            SectionState::Metadata => keywords::HEADER,
            SectionState::Comments => keywords::COMMENTS,
            SectionState::Constants => keywords::CONSTANTS,
            SectionState::Channels => keywords::MEASURCHANNELS,
            SectionState::Data => keywords::MEASURDATA,
            SectionState::End => keywords::END,
        };
        f.write_str(name)
    }
}

/// Content lines grouped under one section header
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSection<'a> {
    pub section: Section,
    /// Line number of the `**KEYWORD` line
    pub header_line: usize,
    pub lines: Vec<LogicalLine<'a>>,
}

/// Recognise a section header line, returning its keyword
///
/// Returns `None` for ordinary content lines.
pub fn header_keyword(text: &str) -> Option<&str> {
    if !text.starts_with(SECTION_PREFIX) {
        return None;
    }
    match SECTION_HEADER.captures(text) {
        Some(captures) => captures.get(1).map(|m| m.as_str()),
        // Starts like a header but is not a well-formed keyword
        None => Some(text[SECTION_PREFIX.len()..].trim()),
    }
}

/// Split logical lines into sections
pub fn classify<'a, I>(
    lines: I,
    config: &ParserConfig,
    ctx: &mut ParseContext,
) -> Result<Vec<ClassifiedSection<'a>>>
where
    I: IntoIterator<Item = LogicalLine<'a>>,
{
    let mut sections: Vec<ClassifiedSection<'a>> = Vec::new();
    let mut ignored_after_end = 0usize;

    for line in lines {
        ctx.advance_to(line.number);

        if ctx.state().is_terminal() {
            ignored_after_end += 1;
            continue;
        }

        if let Some(keyword) = header_keyword(line.text) {
            let section = Section::from_keyword(keyword).ok_or_else(|| {
                TydexError::UnknownSection {
                    location: ctx.here(),
                    keyword: keyword.to_string(),
                }
            })?;

            if sections.iter().any(|s| s.section == section) {
                return Err(TydexError::Validation {
                    location: ctx.here(),
                    reason: format!("section {} appears more than once", section),
                });
            }

            ctx.set_state(section.into());
            sections.push(ClassifiedSection {
                section,
                header_line: line.number,
                lines: Vec::new(),
            });
            continue;
        }

        match sections.last_mut() {
            Some(current) => current.lines.push(line),
            None => {
                return Err(TydexError::Validation {
                    location: ctx.here(),
                    reason: format!("content before the first section header: '{}'", line.text),
                });
            }
        }
    }

    if ignored_after_end > 0 {
        warn!(
            "Ignored {} line(s) after {}{}",
            ignored_after_end,
            SECTION_PREFIX,
            keywords::END
        );
    }

    let state = ctx.state();
    let accepted_eof = state == SectionState::Data && !config.require_end_marker;
    if !state.is_terminal() && !accepted_eof {
        return Err(TydexError::TruncatedFile {
            location: ctx.here(),
            section: state.to_string(),
        });
    }

    debug!(
        "Classified {} sections ({})",
        sections.len(),
        sections
            .iter()
            .map(|s| s.section.keyword())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::LineReader;

    fn classify_text(text: &str, config: &ParserConfig) -> Result<Vec<(Section, usize)>> {
        let reader = LineReader::from_text(text, config);
        let mut ctx = ParseContext::new(None);
        let sections = classify(reader.lines(), config, &mut ctx)?;
        Ok(sections
            .iter()
            .map(|s| (s.section, s.lines.len()))
            .collect())
    }

    #[test]
    fn test_header_keyword() {
        assert_eq!(header_keyword("**HEADER"), Some("HEADER"));
        assert_eq!(header_keyword("** MEASURDATA "), Some("MEASURDATA"));
        assert_eq!(header_keyword("**bogus line"), Some("bogus line"));
        assert_eq!(header_keyword("FZW       Load"), None);
        assert_eq!(header_keyword("*single"), None);
    }

    #[test]
    fn test_classifies_all_sections() {
        let text = "**HEADER\nA\nB\n**COMMENTS\nnote\n**CONSTANTS\nC\n\
                    **MEASURCHANNELS\nX\nY\n**MEASURDATA\n1 2\n3 4\n5 6\n**END\n";
        let sections = classify_text(text, &ParserConfig::default()).unwrap();
        assert_eq!(
            sections,
            vec![
                (Section::Header, 2),
                (Section::Comments, 1),
                (Section::Constants, 1),
                (Section::Channels, 2),
                (Section::Data, 3),
                (Section::End, 0),
            ]
        );
    }

    #[test]
    fn test_unknown_section() {
        let text = "**HEADER\nA\n**MODELDATA\n1\n**END";
        match classify_text(text, &ParserConfig::default()) {
            Err(TydexError::UnknownSection { location, keyword }) => {
                assert_eq!(keyword, "MODELDATA");
                assert_eq!(location.line, 3);
            }
            other => panic!("expected unknown section, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_without_end_marker() {
        let text = "**HEADER\nA\n**MEASURCHANNELS\nX\n**MEASURDATA\n1\n2";
        match classify_text(text, &ParserConfig::default()) {
            Err(TydexError::TruncatedFile { location, section }) => {
                assert_eq!(section, "MEASURDATA");
                assert_eq!(location.line, 7);
            }
            other => panic!("expected truncated file, got {:?}", other),
        }
    }

    #[test]
    fn test_eof_in_data_accepted_when_end_marker_optional() {
        let text = "**MEASURCHANNELS\nX\n**MEASURDATA\n1\n2";
        let config = ParserConfig::default().without_end_marker();
        let sections = classify_text(text, &config).unwrap();
        assert_eq!(sections.last(), Some(&(Section::Data, 2)));
    }

    #[test]
    fn test_eof_in_channels_is_truncated_even_when_end_marker_optional() {
        let text = "**HEADER\nA\n**MEASURCHANNELS\nX";
        let config = ParserConfig::default().without_end_marker();
        assert!(matches!(
            classify_text(text, &config),
            Err(TydexError::TruncatedFile { section, .. }) if section == "MEASURCHANNELS"
        ));
    }

    #[test]
    fn test_empty_input_is_truncated() {
        assert!(matches!(
            classify_text("", &ParserConfig::default()),
            Err(TydexError::TruncatedFile { section, .. }) if section == "START"
        ));
    }

    #[test]
    fn test_content_before_first_header() {
        assert!(matches!(
            classify_text("stray\n**HEADER\n**END", &ParserConfig::default()),
            Err(TydexError::Validation { location, .. }) if location.line == 1
        ));
    }

    #[test]
    fn test_duplicate_section() {
        let text = "**HEADER\nA\n**HEADER\nB\n**END";
        assert!(matches!(
            classify_text(text, &ParserConfig::default()),
            Err(TydexError::Validation { location, .. }) if location.line == 3
        ));
    }

    #[test]
    fn test_lines_after_end_ignored() {
        let text = "**HEADER\nA\n**END\ntrailing junk\n**WHATEVER";
        let sections = classify_text(text, &ParserConfig::default()).unwrap();
        assert_eq!(sections, vec![(Section::Header, 1), (Section::End, 0)]);
    }
}
