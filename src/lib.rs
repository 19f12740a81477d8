//! Tydex Reader Library
//!
//! A Rust library for reading Tydex tire-test data files (as produced by
//! CALSPAN and other tire test facilities) into validated, immutable
//! in-memory documents.
//!
//! This library provides tools for:
//! - Decoding and line-reading Tydex files with comment handling
//! - Classifying `**HEADER`, `**COMMENTS`, `**CONSTANTS`, `**MEASURCHANNELS`
//!   and `**MEASURDATA` sections
//! - Typed parsing of fixed-column items and whitespace-separated data rows
//! - All-or-nothing assembly with line-accurate error reporting
//! - Channel lookup by name, re-serialization, and constant verification
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn example() -> tydex_reader::Result<()> {
//! let doc = tydex_reader::parse_file(Path::new("run01.tdx"))?;
//! let slip = doc.get_channel("SLIPANGL")?;
//! println!("{} samples of slip angle", slip.len());
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod cli;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod fields;
pub mod models;
pub mod parser;
pub mod reader;
pub mod sections;
pub mod verify;
pub mod writer;

use std::path::Path;

// Re-export commonly used types
pub use config::{ColumnLayout, Encoding, ParserConfig};
pub use error::{Result, SourceLocation, TydexError};
pub use models::{ChannelDefinition, ConstantDefinition, FieldValue, HeaderItem, Row, TydexDocument};
pub use parser::TydexParser;
pub use verify::{ToleranceTable, VerificationReport, verify_constants};
pub use writer::{TydexWriter, write_tydex};

/// Parse a Tydex file with the default configuration
pub fn parse_file(path: &Path) -> Result<TydexDocument> {
    TydexParser::default().parse_file(path)
}

/// Parse Tydex text with the default configuration
pub fn parse_str(text: &str) -> Result<TydexDocument> {
    TydexParser::default().parse_str(text)
}
