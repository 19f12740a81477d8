//! Command implementations for the `tydex` binary.

use super::{Args, ChannelArgs, Commands, OutputFormat, ParseArgs, VerifyArgs};
use crate::constants::TYDEX_EXTENSION;
use crate::models::TydexDocument;
use crate::parser::TydexParser;
use crate::verify::{ToleranceTable, VerificationReport, verify_constants};
use crate::writer::TydexWriter;
use anyhow::{Context, Result, bail};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Run the selected command
pub fn run(args: Args) -> Result<()> {
    let config = args
        .parser_config()
        .context("Failed to load parser configuration")?;
    let parser = TydexParser::new(config)?;

    match &args.command {
        Commands::Parse(parse_args) => run_parse(&parser, parse_args),
        Commands::Channel(channel_args) => run_channel(&parser, channel_args),
        Commands::Verify(verify_args) => run_verify(&parser, verify_args, args.show_progress()),
    }
}

fn run_parse(parser: &TydexParser, args: &ParseArgs) -> Result<()> {
    let doc = parser
        .parse_file(&args.file)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    match args.format {
        OutputFormat::Summary => print_summary(&doc),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&doc).context("Failed to serialize document")?;
            println!("{}", json);
        }
        OutputFormat::Tydex => print!("{}", render_tydex(parser, &doc)?),
    }

    Ok(())
}

/// Re-serialize with the layout the document was parsed with
fn render_tydex(parser: &TydexParser, doc: &TydexDocument) -> Result<String> {
    let writer = TydexWriter::new(parser.config().layout.clone());
    Ok(writer.write(doc)?)
}

fn run_channel(parser: &TydexParser, args: &ChannelArgs) -> Result<()> {
    let doc = parser
        .parse_file(&args.file)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let values = if args.converted {
        doc.get_channel_converted(&args.name)?
    } else {
        doc.get_channel(&args.name)?
    };

    for value in values {
        println!("{}", value);
    }
    Ok(())
}

fn run_verify(parser: &TydexParser, args: &VerifyArgs, show_progress: bool) -> Result<()> {
    let files = collect_files(&args.patterns)?;
    if files.is_empty() {
        bail!("No Tydex files matched {}", args.patterns.join(", "));
    }
    info!("Verifying {} file(s)", files.len());

    let table = args
        .tolerances
        .iter()
        .fold(ToleranceTable::default(), |table, (name, limit)| {
            table.with_limit(name.clone(), *limit)
        });

    let progress = if show_progress {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut reports = Vec::new();
    let mut failures = Vec::new();

    for file in &files {
        progress.set_message(display_name(file));
        match parser.parse_file(file) {
            Ok(doc) => reports.push(verify_constants(&doc, &table)),
            Err(error) => {
                warn!("Skipping {}: {}", file.display(), error);
                failures.push((file.clone(), error));
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let flagged = print_verification(&reports);

    for (file, error) in &failures {
        eprintln!("{} {}: {}", "error:".bright_red().bold(), file.display(), error);
    }

    println!(
        "{} {} file(s) verified, {} out of tolerance, {} failed to parse",
        "Summary:".bright_green().bold(),
        reports.len(),
        flagged,
        failures.len()
    );

    if !failures.is_empty() {
        bail!("{} file(s) could not be parsed", failures.len());
    }
    if args.strict && flagged > 0 {
        bail!("{} constant(s) out of tolerance", flagged);
    }
    Ok(())
}

/// Expand patterns into a sorted, de-duplicated file list.
///
/// Directories are scanned recursively for `*.tdx`; everything else is
/// treated as a glob pattern.
pub fn collect_files(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path) {
                let entry = entry.context("Failed to walk directory")?;
                if entry.file_type().is_file()
                    && entry
                        .path()
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(TYDEX_EXTENSION))
                {
                    files.insert(entry.into_path());
                }
            }
            continue;
        }

        let matches =
            glob::glob(pattern).with_context(|| format!("Invalid glob pattern '{}'", pattern))?;
        for entry in matches {
            match entry {
                Ok(file) if file.is_file() => {
                    files.insert(file);
                }
                Ok(_) => {}
                Err(e) => warn!("Unreadable path while expanding '{}': {}", pattern, e),
            }
        }
    }

    debug!("Collected {} file(s) from {} pattern(s)", files.len(), patterns.len());
    Ok(files.into_iter().collect())
}

fn print_summary(doc: &TydexDocument) {
    let title = doc
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<input>".to_string());
    println!("{}", title.bright_green().bold());

    if let Some(date) = doc.measurement_date() {
        println!("  {} {}", "Date:".bright_cyan(), date);
    }
    println!("  {} {}", "Sections:".bright_cyan(), doc.keywords().join(", "));

    if !doc.comments().is_empty() {
        println!("\n{}", "Comments".bright_yellow());
        for comment in doc.comments() {
            println!("  {}", comment);
        }
    }

    if !doc.metadata_items().is_empty() {
        println!("\n{}", "Header".bright_yellow());
        for item in doc.metadata_items() {
            println!("  {:<10} {}", item.name, item.raw);
        }
    }

    if !doc.constants().is_empty() {
        println!("\n{}", "Constants".bright_yellow());
        for constant in doc.constants() {
            println!(
                "  {:<10} {:>14} {:<8} {}",
                constant.name,
                constant.value.to_string(),
                constant.unit,
                constant.description.as_deref().unwrap_or("").bright_black()
            );
        }
    }

    println!(
        "\n{} ({} rows)",
        "Channels".bright_yellow(),
        doc.row_count().to_string().bright_white().bold()
    );
    for channel in doc.channels() {
        println!(
            "  {:<10} {:<8} {}",
            channel.name,
            channel.unit,
            channel.description.as_deref().unwrap_or("").bright_black()
        );
    }
}

/// Print flagged deviations; returns how many were flagged
fn print_verification(reports: &[VerificationReport]) -> usize {
    let mut flagged = 0;

    for report in reports {
        let name = report
            .source
            .as_deref()
            .map(display_name)
            .unwrap_or_else(|| "<input>".to_string());

        for deviation in report.flagged() {
            flagged += 1;
            println!(
                "{}: {:10} does not match within {} (err={:.1}), nominal = {}",
                name.bright_white(),
                deviation.name.bright_red(),
                deviation.tolerance.unwrap_or_default(),
                deviation.mean_difference,
                deviation.nominal
            );
        }
    }

    flagged
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnLayout, ParserConfig};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_files_from_directory() {
        let dir = TempDir::new().unwrap();
        let run_dir = dir.path().join("tire_a").join("Run01");
        fs::create_dir_all(&run_dir).unwrap();
        fs::write(run_dir.join("b.tdx"), "").unwrap();
        fs::write(run_dir.join("a.TDX"), "").unwrap();
        fs::write(run_dir.join("notes.txt"), "").unwrap();

        let files = collect_files(&[dir.path().to_string_lossy().into_owned()]).unwrap();
        let names: Vec<_> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.TDX", "b.tdx"]);
    }

    #[test]
    fn test_collect_files_from_glob_deduplicates() {
        let dir = TempDir::new().unwrap();
        let run_dir = dir.path().join("tire_a").join("Run01");
        fs::create_dir_all(&run_dir).unwrap();
        fs::write(run_dir.join("x.tdx"), "").unwrap();

        let pattern = format!("{}/*/Run*/*.tdx", dir.path().display());
        let files = collect_files(&[pattern.clone(), pattern]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_render_tydex_uses_configured_layout() {
        let layout = ColumnLayout {
            name_width: 6,
            description_width: 12,
            unit_width: 4,
        };
        let text = format!(
            "**MEASURCHANNELS\n{:<6}{:<12}{:<4}\n**MEASURDATA\n1.0\n**END\n",
            "FX", "Force", "N"
        );
        let parser = TydexParser::new(ParserConfig::default().with_layout(layout)).unwrap();
        let doc = parser.parse_str(&text).unwrap();

        let rendered = render_tydex(&parser, &doc).unwrap();
        assert!(rendered.contains("FX    Force       N"));
        assert_eq!(parser.parse_str(&rendered).unwrap(), doc);
    }

    #[test]
    fn test_invalid_glob() {
        assert!(collect_files(&["[".to_string()]).is_err());
    }
}
