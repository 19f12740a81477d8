//! Core data structures for parsed Tydex documents.
//!
//! Defines the scalar field values, constant and channel definitions, and
//! the immutable [`TydexDocument`] with its read-only accessors.

use crate::constants::{DATE_FORMATS, DATE_ITEM};
use crate::error::{Result, TydexError};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A typed scalar read from a Tydex field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value; integers widen to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            // Debug keeps the fractional part so floats stay floats when re-read
            FieldValue::Float(v) => write!(f, "{:?}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A `**HEADER` item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderItem {
    pub name: String,
    pub description: Option<String>,
    /// Value text exactly as written, trimmed
    pub raw: String,
    /// Typed reading of `raw`
    pub value: FieldValue,
}

/// A `**CONSTANTS` item: a named numeric value with a unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantDefinition {
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub value: FieldValue,
}

impl ConstantDefinition {
    /// Numeric value of the constant
    pub fn numeric_value(&self) -> f64 {
        // Assembly rejects non-numeric constants
        self.value.as_f64().unwrap_or(f64::NAN)
    }
}

/// A `**MEASURCHANNELS` item describing one data column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDefinition {
    pub name: String,
    pub unit: String,
    pub description: Option<String>,
    /// Numeric values after the unit column: conversion factor, then offset
    pub conversion: Vec<f64>,
}

impl ChannelDefinition {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            description: None,
            conversion: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_conversion(mut self, conversion: Vec<f64>) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn factor(&self) -> Option<f64> {
        self.conversion.first().copied()
    }

    pub fn offset(&self) -> Option<f64> {
        self.conversion.get(1).copied()
    }

    /// Apply the channel's conversion (`value * factor + offset`)
    pub fn convert(&self, value: f64) -> f64 {
        value * self.factor().unwrap_or(1.0) + self.offset().unwrap_or(0.0)
    }
}

/// A parsed, validated Tydex file
///
/// Built only by the parser; immutable afterwards. Every measurement row
/// holds exactly one value per channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TydexDocument {
    source: Option<PathBuf>,
    keywords: Vec<String>,
    metadata: Vec<HeaderItem>,
    comments: Vec<String>,
    constants: Vec<ConstantDefinition>,
    channels: Vec<ChannelDefinition>,
    measurements: Vec<Vec<f64>>,
}

impl TydexDocument {
    pub(crate) fn new(
        source: Option<PathBuf>,
        keywords: Vec<String>,
        metadata: Vec<HeaderItem>,
        comments: Vec<String>,
        constants: Vec<ConstantDefinition>,
        channels: Vec<ChannelDefinition>,
        measurements: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert!(measurements.iter().all(|row| row.len() == channels.len()));
        Self {
            source,
            keywords,
            metadata,
            comments,
            constants,
            channels,
            measurements,
        }
    }

    /// File the document was parsed from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Section keywords in file order
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn metadata_items(&self) -> &[HeaderItem] {
        &self.metadata
    }

    /// Header value by key
    pub fn metadata(&self, key: &str) -> Option<&FieldValue> {
        self.metadata
            .iter()
            .find(|item| item.name == key)
            .map(|item| &item.value)
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn constants(&self) -> &[ConstantDefinition] {
        &self.constants
    }

    pub fn constant(&self, name: &str) -> Option<&ConstantDefinition> {
        self.constants.iter().find(|c| c.name == name)
    }

    pub fn channels(&self) -> &[ChannelDefinition] {
        &self.channels
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channel_index(name).is_some()
    }

    /// Channel definition by name
    pub fn channel(&self, name: &str) -> Result<&ChannelDefinition> {
        let index = self.require_channel(name)?;
        Ok(&self.channels[index])
    }

    /// All values of one channel, in row order
    pub fn get_channel(&self, name: &str) -> Result<Vec<f64>> {
        let index = self.require_channel(name)?;
        Ok(self.measurements.iter().map(|row| row[index]).collect())
    }

    /// Channel values with the channel's conversion applied
    pub fn get_channel_converted(&self, name: &str) -> Result<Vec<f64>> {
        let index = self.require_channel(name)?;
        let channel = &self.channels[index];
        Ok(self
            .measurements
            .iter()
            .map(|row| channel.convert(row[index]))
            .collect())
    }

    pub fn row_count(&self) -> usize {
        self.measurements.len()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.measurements.get(index).map(|values| Row {
            index,
            values,
            channels: &self.channels,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.measurements
            .iter()
            .enumerate()
            .map(|(index, values)| Row {
                index,
                values,
                channels: &self.channels,
            })
    }

    /// Header value text as written in the file
    pub fn metadata_raw(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|item| item.name == key)
            .map(|item| item.raw.as_str())
    }

    /// Measurement date from the `DATE` header item, if present and recognised
    pub fn measurement_date(&self) -> Option<NaiveDate> {
        let text = self.metadata_raw(DATE_ITEM)?;

        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text.trim(), format).ok())
    }

    fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == name)
    }

    fn require_channel(&self, name: &str) -> Result<usize> {
        self.channel_index(name)
            .ok_or_else(|| TydexError::UnknownChannel {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for TydexDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(path) => write!(f, "{}: ", path.display())?,
            None => write!(f, "<input>: ")?,
        }
        write!(
            f,
            "{} header items, {} constants, {} channels, {} rows",
            self.metadata.len(),
            self.constants.len(),
            self.channels.len(),
            self.measurements.len()
        )?;
        if !self.comments.is_empty() {
            write!(f, " ({})", self.comments.join(" "))?;
        }
        Ok(())
    }
}

/// One measurement row, addressable by channel name
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    index: usize,
    values: &'a [f64],
    channels: &'a [ChannelDefinition],
}

impl<'a> Row<'a> {
    /// 0-based position of the row in the data section
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, channel: &str) -> Result<f64> {
        self.channels
            .iter()
            .position(|c| c.name == channel)
            .map(|i| self.values[i])
            .ok_or_else(|| TydexError::UnknownChannel {
                name: channel.to_string(),
            })
    }

    /// (channel name, value) pairs in channel order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        let channels = self.channels;
        let values = self.values;
        channels
            .iter()
            .zip(values.iter())
            .map(|(c, v)| (c.name.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> TydexDocument {
        TydexDocument::new(
            None,
            vec!["HEADER".to_string(), "MEASURCHANNELS".to_string()],
            vec![HeaderItem {
                name: "DATE".to_string(),
                description: Some("Date".to_string()),
                raw: "13-Jun-2022".to_string(),
                value: FieldValue::Text("13-Jun-2022".to_string()),
            }],
            vec!["Run 1".to_string()],
            vec![ConstantDefinition {
                name: "FZW".to_string(),
                description: None,
                unit: "N".to_string(),
                value: FieldValue::Integer(4000),
            }],
            vec![
                ChannelDefinition::new("FZW", "N").with_description("Vertical load"),
                ChannelDefinition::new("SLIPANGL", "deg").with_conversion(vec![2.0, 1.0]),
            ],
            vec![vec![3990.0, 0.0], vec![4010.0, 0.5]],
        )
    }

    #[test]
    fn test_get_channel() {
        let doc = sample_document();
        assert_eq!(doc.get_channel("FZW").unwrap(), vec![3990.0, 4010.0]);
        assert_eq!(doc.get_channel_converted("SLIPANGL").unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_unknown_channel() {
        let doc = sample_document();
        assert!(matches!(
            doc.get_channel("FX"),
            Err(TydexError::UnknownChannel { name }) if name == "FX"
        ));
        assert!(doc.channel("FX").is_err());
        assert!(!doc.has_channel("FX"));
    }

    #[test]
    fn test_row_access() {
        let doc = sample_document();
        let row = doc.row(1).unwrap();
        assert_eq!(row.index(), 1);
        assert_eq!(row.get("SLIPANGL").unwrap(), 0.5);
        assert!(row.get("FX").is_err());

        let pairs: Vec<_> = row.iter().collect();
        assert_eq!(pairs, vec![("FZW", 4010.0), ("SLIPANGL", 0.5)]);
        assert!(doc.row(2).is_none());
        assert!(doc.rows().all(|r| r.len() == doc.channels().len()));
    }

    #[test]
    fn test_metadata_and_constants() {
        let doc = sample_document();
        assert_eq!(doc.metadata("DATE").and_then(|v| v.as_str()), Some("13-Jun-2022"));
        assert!(doc.metadata("SUPPLIER").is_none());
        assert_eq!(doc.constant("FZW").unwrap().numeric_value(), 4000.0);
        assert_eq!(doc.constant("FZW").unwrap().value.as_i64(), Some(4000));
        assert_eq!(doc.metadata_raw("DATE"), Some("13-Jun-2022"));
        assert_eq!(
            doc.channel("FZW").unwrap().description.as_deref(),
            Some("Vertical load")
        );
    }

    #[test]
    fn test_measurement_date() {
        let doc = sample_document();
        assert_eq!(
            doc.measurement_date(),
            NaiveDate::from_ymd_opt(2022, 6, 13)
        );
    }

    #[test]
    fn test_field_value_display_keeps_float_marker() {
        assert_eq!(FieldValue::Float(1.0).to_string(), "1.0");
        assert_eq!(FieldValue::Integer(1).to_string(), "1");
        assert_eq!(FieldValue::Text("abc".into()).to_string(), "abc");
    }

    #[test]
    fn test_display_summary() {
        let summary = sample_document().to_string();
        assert!(summary.contains("2 channels"));
        assert!(summary.contains("2 rows"));
        assert!(summary.contains("Run 1"));
    }
}
