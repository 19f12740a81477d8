//! Configuration management and validation.
//!
//! Provides the parser configuration: input encoding, numeric conventions,
//! comment handling and the fixed-column layout of item lines. Settings
//! are layered as defaults, then an optional JSON file, then environment
//! variables; the CLI applies its own overrides last.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_COMMENT_PREFIX, DEFAULT_DECIMAL_SEPARATOR,
    DESCRIPTION_WIDTH, ENV_DECIMAL_SEPARATOR, ENV_ENCODING, MAX_LAYOUT_WIDTH, NAME_WIDTH,
    UNIT_WIDTH,
};
use crate::error::{Result, TydexError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Text encoding of the input bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Strict UTF-8; invalid sequences are an error
    Utf8,
    /// ISO-8859-1; every byte maps to one character
    Latin1,
}

impl FromStr for Encoding {
    type Err = TydexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Encoding::Latin1),
            other => Err(TydexError::configuration(format!(
                "Unsupported encoding '{}' (expected utf8 or latin1)",
                other
            ))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf8"),
            Encoding::Latin1 => write!(f, "latin1"),
        }
    }
}

/// Fixed-column layout of HEADER, CONSTANTS and MEASURCHANNELS lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub name_width: usize,
    pub description_width: usize,
    pub unit_width: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            name_width: NAME_WIDTH,
            description_width: DESCRIPTION_WIDTH,
            unit_width: UNIT_WIDTH,
        }
    }
}

impl ColumnLayout {
    /// Character range of the item name
    pub fn name_range(&self) -> Range<usize> {
        0..self.name_width
    }

    /// Character range of the description
    pub fn description_range(&self) -> Range<usize> {
        let start = self.name_width;
        start..start + self.description_width
    }

    /// Character range of the unit
    pub fn unit_range(&self) -> Range<usize> {
        let start = self.name_width + self.description_width;
        start..start + self.unit_width
    }

    /// First character of the value column
    pub fn value_start(&self) -> usize {
        self.name_width + self.description_width + self.unit_width
    }
}

/// Parser configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Encoding used to decode the input bytes
    pub encoding: Encoding,

    /// Decimal separator used by numeric fields ('.' or ',')
    pub decimal_separator: char,

    /// Lines starting with this character are ignored
    pub comment_prefix: char,

    /// Require an explicit **END marker; without it EOF in the data section is accepted
    pub require_end_marker: bool,

    /// Fixed-column layout of item lines
    pub layout: ColumnLayout,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            decimal_separator: DEFAULT_DECIMAL_SEPARATOR,
            comment_prefix: DEFAULT_COMMENT_PREFIX,
            require_end_marker: true,
            layout: ColumnLayout::default(),
        }
    }
}

impl ParserConfig {
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    pub fn with_comment_prefix(mut self, prefix: char) -> Self {
        self.comment_prefix = prefix;
        self
    }

    /// Accept files that end inside the data section without **END
    pub fn without_end_marker(mut self) -> Self {
        self.require_end_marker = false;
        self
    }

    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Check the configuration for values the parser cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.decimal_separator != '.' && self.decimal_separator != ',' {
            return Err(TydexError::configuration(format!(
                "Decimal separator must be '.' or ',', got '{}'",
                self.decimal_separator
            )));
        }

        let prefix = self.comment_prefix;
        if prefix == '*' || prefix.is_ascii_digit() || prefix.is_whitespace() || "+-.,".contains(prefix)
        {
            return Err(TydexError::configuration(format!(
                "Comment prefix '{}' would collide with section headers or data",
                prefix
            )));
        }

        if self.layout.name_width == 0 {
            return Err(TydexError::configuration("Name column width must be non-zero"));
        }

        let total = self
            .layout
            .name_width
            .checked_add(self.layout.description_width)
            .and_then(|w| w.checked_add(self.layout.unit_width));
        if !total.is_some_and(|w| w <= MAX_LAYOUT_WIDTH) {
            return Err(TydexError::configuration(format!(
                "Column widths must add up to at most {} characters",
                MAX_LAYOUT_WIDTH
            )));
        }

        Ok(())
    }

    /// Default config file location (`<config dir>/tydex/config.json`)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TydexError::configuration("Could not determine user config directory"))?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TydexError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| {
            TydexError::configuration(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Load with layered configuration (defaults -> file -> environment)
    ///
    /// An explicit `config_file` must exist; otherwise the default location is
    /// used only when present.
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Ok(path) if path.exists() => {
                    debug!("Using config file: {}", path.display());
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ENCODING) {
            self.encoding = value.parse()?;
            debug!("Encoding overridden from environment: {}", self.encoding);
        }

        if let Some(value) = lookup(ENV_DECIMAL_SEPARATOR) {
            let mut chars = value.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(separator), None) => self.decimal_separator = separator,
                _ => {
                    return Err(TydexError::configuration(format!(
                        "{} must be a single character, got '{}'",
                        ENV_DECIMAL_SEPARATOR, value
                    )));
                }
            }
        }

        Ok(())
    }
}
