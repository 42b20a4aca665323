//! turnwire CLI
//!
//! Encodes JSONL training records into function-calling transcripts, decodes
//! transcripts back into messages, and checks call/result pairing.

mod commands;
mod config;
mod display;
mod error;
mod records;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;

use crate::commands::DecodeFormat;
use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (default: ~/.config/turnwire/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode JSONL training records into transcript text
    Encode {
        /// Input JSONL file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output JSONL file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include per-message byte ranges and trainable flags
        #[arg(long)]
        segments: bool,
    },

    /// Decode a raw transcript into messages
    Decode {
        /// Transcript file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = DecodeFormat::Pretty)]
        format: DecodeFormat,
    },

    /// Render a JSON array of function specs as the system-prompt listing
    Schema {
        /// JSON file holding the function specs
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the end markers to register as tokenizer special tokens
    Tokens,

    /// Check call/result pairing in JSONL training records
    Validate {
        /// Input JSONL file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Exit with a failure status when any record has warnings
        #[arg(long)]
        strict: bool,

        /// Print one JSON report per record
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    debug!("Using configuration: {config:?}");

    match args.command {
        Command::Encode {
            input,
            output,
            segments,
        } => {
            commands::encode(input.as_deref(), output.as_deref(), segments, &config)
                .context("Failed to encode records")?;
        }
        Command::Decode { input, format } => {
            commands::decode_text(input.as_deref(), format).context("Failed to decode transcript")?;
        }
        Command::Schema { file } => {
            commands::schema(&file, &config)
                .with_context(|| format!("Failed to render {}", file.display()))?;
        }
        Command::Tokens => commands::tokens(),
        Command::Validate {
            input,
            strict,
            json,
        } => {
            let clean = commands::validate_records(input.as_deref(), json)
                .context("Failed to validate records")?;
            if !clean && (strict || config.validate.strict) {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
