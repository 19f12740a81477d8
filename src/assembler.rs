//! Record assembly: classified sections into a validated document.
//!
//! Each section is converted with the [`FieldParser`]; problems are
//! recorded in the [`ParseContext`] so one pass reports everything, and the
//! document is only built when no problem was recorded.

use crate::context::ParseContext;
use crate::error::{Result, TydexError};
use crate::fields::FieldParser;
use crate::models::{ChannelDefinition, ConstantDefinition, FieldValue, HeaderItem, TydexDocument};
use crate::reader::LogicalLine;
use crate::sections::{ClassifiedSection, Section};
use std::collections::HashSet;
use tracing::debug;

/// Builds a [`TydexDocument`] from classified sections
#[derive(Debug)]
pub struct RecordAssembler<'p> {
    fields: &'p FieldParser,
}

impl<'p> RecordAssembler<'p> {
    pub fn new(fields: &'p FieldParser) -> Self {
        Self { fields }
    }

    /// Assemble the document, or fail with the first recorded problem
    pub fn assemble(
        &self,
        sections: &[ClassifiedSection<'_>],
        mut ctx: ParseContext,
    ) -> Result<TydexDocument> {
        let mut metadata = Vec::new();
        let mut comments = Vec::new();
        let mut constants = Vec::new();
        let mut channels: Option<Vec<ChannelDefinition>> = None;
        let mut measurements = Vec::new();

        for section in sections {
            ctx.set_state(section.section.into());
            ctx.advance_to(section.header_line);

            match section.section {
                Section::Header => metadata = self.header_items(&section.lines, &mut ctx),
                Section::Comments => {
                    comments = section.lines.iter().map(|l| l.raw.to_string()).collect();
                }
                Section::Constants => constants = self.constants(&section.lines, &mut ctx),
                Section::Channels => channels = Some(self.channels(&section.lines, &mut ctx)),
                Section::Data => match &channels {
                    Some(defined) => {
                        measurements = self.measurements(&section.lines, defined.len(), &mut ctx);
                    }
                    None => ctx.record(TydexError::Validation {
                        location: ctx.location(section.header_line),
                        reason: format!(
                            "{} appears before {}",
                            Section::Data,
                            Section::Channels
                        ),
                    }),
                },
                Section::End => {}
            }
        }

        let source = ctx.source().map(|p| p.to_path_buf());
        ctx.finish()?;

        let channels = channels.unwrap_or_default();
        debug!(
            "Assembled document: {} header items, {} constants, {} channels, {} rows",
            metadata.len(),
            constants.len(),
            channels.len(),
            measurements.len()
        );

        Ok(TydexDocument::new(
            source,
            sections
                .iter()
                .map(|s| s.section.keyword().to_string())
                .collect(),
            metadata,
            comments,
            constants,
            channels,
            measurements,
        ))
    }

    fn header_items(&self, lines: &[LogicalLine<'_>], ctx: &mut ParseContext) -> Vec<HeaderItem> {
        let mut items: Vec<HeaderItem> = Vec::new();

        for line in lines {
            ctx.advance_to(line.number);
            let fields = self.fields.split_item(line.raw);

            if fields.name.is_empty() {
                ctx.record(missing_name(ctx, "header item"));
                continue;
            }
            if items.iter().any(|item| item.name == fields.name) {
                ctx.record(duplicate(ctx, "header item", fields.name));
                continue;
            }

            items.push(HeaderItem {
                name: fields.name.to_string(),
                description: non_empty(fields.description),
                raw: fields.value.to_string(),
                value: self.fields.infer(fields.value),
            });
        }

        items
    }

    fn constants(
        &self,
        lines: &[LogicalLine<'_>],
        ctx: &mut ParseContext,
    ) -> Vec<ConstantDefinition> {
        let mut constants: Vec<ConstantDefinition> = Vec::new();

        for line in lines {
            ctx.advance_to(line.number);
            let fields = self.fields.split_item(line.raw);

            if fields.name.is_empty() {
                ctx.record(missing_name(ctx, "constant"));
                continue;
            }
            if constants.iter().any(|c| c.name == fields.name) {
                ctx.record(duplicate(ctx, "constant", fields.name));
                continue;
            }
            if fields.value.is_empty() {
                ctx.record(TydexError::Validation {
                    location: ctx.here(),
                    reason: format!("constant '{}' has no value", fields.name),
                });
                continue;
            }

            // A value like "4000 N" carries its own unit when the unit column is blank
            let parsed: Result<(FieldValue, String)> =
                if fields.unit.is_empty() && fields.value.contains(char::is_whitespace) {
                    self.fields.parse_quantity(fields.value, &ctx.here())
                } else {
                    self.fields
                        .parse_number(fields.value, &ctx.here())
                        .map(|value| (value, fields.unit.to_string()))
                };

            if let Some((value, unit)) = ctx.check(parsed) {
                constants.push(ConstantDefinition {
                    name: fields.name.to_string(),
                    description: non_empty(fields.description),
                    unit,
                    value,
                });
            }
        }

        constants
    }

    fn channels(&self, lines: &[LogicalLine<'_>], ctx: &mut ParseContext) -> Vec<ChannelDefinition> {
        let mut channels = Vec::new();
        let mut seen = HashSet::new();

        for line in lines {
            ctx.advance_to(line.number);
            let fields = self.fields.split_item(line.raw);

            if fields.name.is_empty() {
                ctx.record(missing_name(ctx, "channel"));
                continue;
            }
            if !seen.insert(fields.name) {
                ctx.record(duplicate(ctx, "channel", fields.name));
                continue;
            }

            let conversion = ctx.check(self.fields.parse_row(fields.value, &ctx.here()));
            channels.push(ChannelDefinition {
                name: fields.name.to_string(),
                unit: fields.unit.to_string(),
                description: non_empty(fields.description),
                conversion: conversion.unwrap_or_default(),
            });
        }

        channels
    }

    fn measurements(
        &self,
        lines: &[LogicalLine<'_>],
        channel_count: usize,
        ctx: &mut ParseContext,
    ) -> Vec<Vec<f64>> {
        let mut rows = Vec::with_capacity(lines.len());

        for (row_index, line) in lines.iter().enumerate() {
            ctx.advance_to(line.number);

            let Some(values) = ctx.check(self.fields.parse_row(line.text, &ctx.here())) else {
                continue;
            };

            if values.len() != channel_count {
                ctx.record(TydexError::Validation {
                    location: ctx.here(),
                    reason: format!(
                        "data row {} has {} values but {} channels are defined",
                        row_index + 1,
                        values.len(),
                        channel_count
                    ),
                });
                continue;
            }

            rows.push(values);
        }

        rows
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn missing_name(ctx: &ParseContext, what: &str) -> TydexError {
    TydexError::Validation {
        location: ctx.here(),
        reason: format!("{} without a name", what),
    }
}

fn duplicate(ctx: &ParseContext, what: &str, name: &str) -> TydexError {
    TydexError::Validation {
        location: ctx.here(),
        reason: format!("duplicate {} '{}'", what, name),
    }
}
