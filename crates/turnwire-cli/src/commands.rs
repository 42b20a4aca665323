//! Command implementations for the CLI.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use colored::Colorize;
use log::{debug, info};
use turnwire::{FunctionSpec, decode, render_functions, special_tokens, validate};

use crate::config::CliConfig;
use crate::display::{display_decoded, format_warning};
use crate::error::Result;
use crate::records::{RecordReport, encode_record, read_records, write_jsonl};

/// Output format of the `decode` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DecodeFormat {
    /// Colored, human-readable listing
    #[default]
    Pretty,
    /// The decoded structure as JSON
    Json,
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    })
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}

/// Encodes JSONL training records into JSONL `{"text": ...}` lines.
pub fn encode(
    input: Option<&Path>,
    output: Option<&Path>,
    with_segments: bool,
    config: &CliConfig,
) -> Result<()> {
    let records = read_records(open_input(input)?)?;
    debug!("Read {} record(s)", records.len());

    let encoded = records
        .into_iter()
        .map(|(line, record)| encode_record(line, record, &config.prompt, with_segments))
        .collect::<Result<Vec<_>>>()?;

    let mut writer = open_output(output)?;
    write_jsonl(&mut writer, &encoded)?;
    info!("Encoded {} record(s)", encoded.len());
    Ok(())
}

/// Decodes a raw transcript.
pub fn decode_text(input: Option<&Path>, format: DecodeFormat) -> Result<()> {
    let mut text = String::new();
    open_input(input)?.read_to_string(&mut text)?;

    let decoded = decode(&text);
    match format {
        DecodeFormat::Pretty => display_decoded(&decoded),
        DecodeFormat::Json => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &decoded)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

/// Renders a JSON array of function specs as the system-prompt listing.
pub fn schema(file: &Path, config: &CliConfig) -> Result<()> {
    let contents = fs::read_to_string(file)?;
    let functions: Vec<FunctionSpec> = serde_json::from_str(&contents)?;

    println!("{}", render_functions(&functions, &config.prompt.namespace));
    Ok(())
}

/// Prints the end markers to register as special tokens.
pub fn tokens() {
    for token in special_tokens() {
        println!("{token}");
    }
}

/// Checks call/result pairing of every record.
///
/// Returns `true` if no record produced a warning.
pub fn validate_records(input: Option<&Path>, json: bool) -> Result<bool> {
    let records = read_records(open_input(input)?)?;

    let reports: Vec<RecordReport> = records
        .iter()
        .map(|(line, record)| RecordReport {
            line: *line,
            warnings: validate(&record.messages),
        })
        .collect();
    let flagged = reports.iter().filter(|r| !r.warnings.is_empty()).count();

    if json {
        write_jsonl(&mut io::stdout().lock(), &reports)?;
    } else {
        for report in reports.iter().filter(|r| !r.warnings.is_empty()) {
            println!("{}", format!("line {}", report.line).bright_cyan().bold());
            for warning in &report.warnings {
                println!("  {}", format_warning(warning));
            }
        }
        let summary = format!("{} record(s), {flagged} with warnings", reports.len());
        if flagged == 0 {
            println!("{} {summary}", "✓".bright_green());
        } else {
            println!("{} {summary}", "✗".bright_red());
        }
    }

    Ok(flagged == 0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::io::Write as _;

    use super::*;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_encode_writes_jsonl() {
        let input = write_temp(
            "{\"messages\": [{\"role\": \"user\", \"content\": \"Hi\"}, {\"role\": \"assistant\", \"content\": \"Hello\"}]}\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jsonl");

        encode(Some(input.path()), Some(&output), true, &CliConfig::default()).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        let value: serde_json::Value = serde_json::from_str(written.trim()).unwrap();
        let text = value["text"].as_str().unwrap();
        assert!(text.starts_with("system:\n"));
        assert!(text.ends_with("assistant:\nHello\n<|END_OF_ASSISTANT|>\n"));
        assert_eq!(value["segments"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_validate_records_flags_warnings() {
        let clean = write_temp(
            "{\"messages\": [{\"role\": \"assistant\", \"function_call\": {\"name\": \"f\", \"arguments\": \"{}\"}}, {\"role\": \"function\", \"name\": \"f\", \"content\": \"1\"}]}\n",
        );
        assert!(validate_records(Some(clean.path()), true).unwrap());

        let unpaired =
            write_temp("{\"messages\": [{\"role\": \"function\", \"name\": \"f\", \"content\": \"1\"}]}\n");
        assert!(!validate_records(Some(unpaired.path()), true).unwrap());
    }

    #[test]
    fn test_schema_rejects_invalid_json() {
        let file = write_temp("not json");
        assert!(schema(file.path(), &CliConfig::default()).is_err());
    }
}
