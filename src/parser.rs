//! Core Tydex parser implementation
//!
//! This module provides the main parser orchestration: reading and decoding
//! the input, classifying sections, and handing them to the record
//! assembler. A parse either returns a complete document or an error.

use std::path::Path;
use tracing::{debug, info};

use crate::assembler::RecordAssembler;
use crate::config::ParserConfig;
use crate::context::ParseContext;
use crate::error::Result;
use crate::fields::FieldParser;
use crate::models::TydexDocument;
use crate::reader::LineReader;
use crate::sections::classify;

/// Tydex file parser
///
/// Holds only configuration, so one parser can be reused for any number of
/// files; each call produces an independent document.
#[derive(Debug, Clone)]
pub struct TydexParser {
    config: ParserConfig,
    fields: FieldParser,
}

impl TydexParser {
    /// Create a parser, rejecting invalid configuration
    pub fn new(config: ParserConfig) -> Result<Self> {
        config.validate()?;
        let fields = FieldParser::new(&config);
        Ok(Self { config, fields })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a Tydex file from disk
    pub fn parse_file(&self, file_path: &Path) -> Result<TydexDocument> {
        info!("Parsing Tydex file: {}", file_path.display());

        let reader = LineReader::from_path(file_path, &self.config)?;
        let document = self.parse_reader(&reader)?;

        info!(
            "Parsed {} rows across {} channels from {}",
            document.row_count(),
            document.channels().len(),
            file_path.display()
        );
        Ok(document)
    }

    /// Parse raw bytes, decoding them with the configured encoding
    pub fn parse_bytes(&self, bytes: &[u8], source: Option<&Path>) -> Result<TydexDocument> {
        let reader = LineReader::from_bytes(bytes, source.map(Path::to_path_buf), &self.config)?;
        self.parse_reader(&reader)
    }

    /// Parse text that is already decoded
    pub fn parse_str(&self, text: &str) -> Result<TydexDocument> {
        let reader = LineReader::from_text(text, &self.config);
        self.parse_reader(&reader)
    }

    fn parse_reader(&self, reader: &LineReader) -> Result<TydexDocument> {
        let mut ctx = ParseContext::new(reader.path());

        let sections = classify(reader.lines(), &self.config, &mut ctx)?;
        debug!("Classification finished at line {}", ctx.line());

        RecordAssembler::new(&self.fields).assemble(&sections, ctx)
    }
}

impl Default for TydexParser {
    fn default() -> Self {
        let config = ParserConfig::default();
        let fields = FieldParser::new(&config);
        Self { config, fields }
    }
}
