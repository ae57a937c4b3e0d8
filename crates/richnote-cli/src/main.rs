// SPDX-License-Identifier: AGPL-3.0-or-later
//! Command-line front end for richnote
//!
//! Reads a note body from a file or stdin and writes the converted form
//! to stdout. Diagnostics go to stderr through `tracing`.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use richnote_core::{
    contains_table_with, decode_text, encode_text, normalize_with, project_native,
    stored_contains_table, to_document_with, to_markup_with, Content, Document, FormatHandler,
    FormatRegistry, Renderer, SourceFormat,
};
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "richnote", version)]
#[command(about = "Convert rich-text note bodies between markup, documents and plain text")]
struct Cli {
    /// TOML config file (defaults to ./richnote.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize a stored body (JSON in any legacy shape, or raw markup)
    Normalize {
        /// Input file, `-` or absent for stdin
        input: Option<PathBuf>,
    },
    /// Serialize document JSON to markup
    ToMarkup { input: Option<PathBuf> },
    /// Parse markup to document JSON
    ToDocument { input: Option<PathBuf> },
    /// Project a stored body to native display blocks
    Project { input: Option<PathBuf> },
    /// Print whether a stored body holds table structure
    HasTable { input: Option<PathBuf> },
    /// Decode plain-text shorthand to document JSON
    DecodeText { input: Option<PathBuf> },
    /// Encode document JSON as plain-text shorthand
    EncodeText { input: Option<PathBuf> },
    /// Convert between markup and plain text
    Convert {
        #[arg(long, value_enum)]
        from: Format,
        #[arg(long, value_enum)]
        to: Format,
        input: Option<PathBuf>,
    },
    /// Word and character counts of a stored body
    Stats { input: Option<PathBuf> },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Markup,
    Text,
}

impl From<Format> for SourceFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Markup => SourceFormat::Markup,
            Format::Text => SourceFormat::PlainText,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config);
    tracing::debug!(?config, command = ?cli.command, "starting");

    let output = run(cli.command, &config)?;
    println!("{output}");
    Ok(())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_deref().unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command, config: &Config) -> Result<String> {
    let parse_config = config.parse_config();
    let render_config = config.render_config();

    let output = match command {
        Command::Normalize { input } => {
            let (content, _) = read_content(input.as_deref())?;
            to_json(&normalize_with(content, &parse_config, &render_config))?
        }
        Command::ToMarkup { input } => {
            to_markup_with(&read_document(input.as_deref())?, &render_config)
        }
        Command::ToDocument { input } => {
            to_json(&to_document_with(&read_input(input.as_deref())?, &parse_config))?
        }
        Command::Project { input } => {
            let (content, _) = read_content(input.as_deref())?;
            let normalized = normalize_with(content, &parse_config, &render_config);
            to_json(&project_native(&normalized.document))?
        }
        Command::HasTable { input } => {
            let found = match read_content(input.as_deref())? {
                (_, Some(value)) => stored_contains_table(&value, config.table_policy),
                (content, None) => contains_table_with(&content, config.table_policy),
            };
            found.to_string()
        }
        Command::DecodeText { input } => to_json(&decode_text(&read_input(input.as_deref())?))?,
        Command::EncodeText { input } => encode_text(&read_document(input.as_deref())?),
        Command::Convert { from, to, input } => convert(
            &read_input(input.as_deref())?,
            from.into(),
            to.into(),
            config,
        )?,
        Command::Stats { input } => {
            let (content, _) = read_content(input.as_deref())?;
            let document = normalize_with(content, &parse_config, &render_config).document;
            to_json(&serde_json::json!({
                "blocks": document.content.len(),
                "words": document.word_count(),
                "characters": document.char_count(),
            }))?
        }
    };
    Ok(output)
}

fn convert(input: &str, from: SourceFormat, to: SourceFormat, config: &Config) -> Result<String> {
    if from == to {
        return Ok(input.to_string());
    }
    let registry = FormatRegistry::with_defaults();
    let doc = registry.parse(input, from, &config.parse_config())?;
    let target = registry
        .get(to)
        .with_context(|| format!("no handler for {}", to.label()))?;
    if doc.has_marks() && !target.supports_feature("bold") {
        tracing::warn!(to = to.label(), "inline formatting is dropped by the target format");
    }
    Ok(target.render(&doc, &config.render_config()))
}

/// Read a file, or stdin for `-` or no path
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("reading stdin")?;
            Ok(input)
        }
    }
}

/// Stored body: JSON in any legacy shape, or raw markup when not JSON
fn read_content(path: Option<&Path>) -> Result<(Content, Option<Value>)> {
    let input = read_input(path)?;
    match serde_json::from_str::<Value>(&input) {
        Ok(value) => Ok((Content::from_json_value(&value), Some(value))),
        Err(_) => {
            tracing::debug!("input is not JSON, reading it as markup");
            Ok((Content::Markup(input), None))
        }
    }
}

fn read_document(path: Option<&Path>) -> Result<Document> {
    let input = read_input(path)?;
    serde_json::from_str(&input).context("input is not document JSON")
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serializing output")
}
