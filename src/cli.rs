use crate::analysis::{article_title, parse_analysis};
use crate::canvas::{compile, write_document};
use crate::config::load_config;
use crate::ir::ContentNode;
use crate::notes::render_notes;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "canvasc",
    version,
    about = "Compile a document breakdown into a canvas graph document"
)]
pub struct Args {
    /// Breakdown tree (.json) or analyzer response (.md), or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Input format. `auto` picks markdown for .md/.markdown files, JSON otherwise.
    #[arg(short = 'f', long = "format", value_enum, default_value = "auto")]
    pub format: InputFormat,

    /// Vault path of the original document (markdown input only; defaults to the input path)
    #[arg(short = 's', long = "source")]
    pub source: Option<String>,

    /// Output canvas file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (layout geometry overrides)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Vault folder holding the breakdown notes ('' for none)
    #[arg(long = "folder")]
    pub folder: Option<String>,

    /// Indent the canvas JSON
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Also write the markdown notes below this directory
    #[arg(long = "notes-dir")]
    pub notes_dir: Option<PathBuf>,

    /// Date stamped into note front matter (YYYY-MM-DD). Defaults to today.
    #[arg(long = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Auto,
    Json,
    Markdown,
}

pub fn run() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(folder) = args.folder.clone() {
        config.folder = Some(folder);
    }

    let input = read_input(args.input.as_deref())?;
    let tree = build_tree(&args, &input)?;
    let document = compile(&tree, &config)?;
    write_document(&document, args.output.as_deref(), args.pretty)?;

    if let Some(dir) = args.notes_dir.as_deref() {
        let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
        for note in render_notes(&tree, &config, date)? {
            let path = dir.join(&note.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(&path, note.content)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote note");
        }
    }
    Ok(())
}

/// Logs go to stderr so stdout stays the canvas document.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn build_tree(args: &Args, input: &str) -> Result<ContentNode> {
    match resolve_format(args.format, args.input.as_deref()) {
        InputFormat::Markdown => {
            let source = args
                .source
                .clone()
                .or_else(|| {
                    args.input
                        .as_deref()
                        .filter(|path| *path != Path::new("-"))
                        .map(|path| path.to_string_lossy().into_owned())
                })
                .ok_or_else(|| anyhow::anyhow!("--source is required for markdown on stdin"))?;
            let title = article_title(&source, "");
            Ok(parse_analysis(input, &source, &title)?)
        }
        _ => serde_json::from_str(input).context("parsing breakdown tree JSON"),
    }
}

fn resolve_format(format: InputFormat, path: Option<&Path>) -> InputFormat {
    if format != InputFormat::Auto {
        return format;
    }
    let is_md = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|ext| matches!(ext, "md" | "markdown"))
        .unwrap_or(false);
    if is_md {
        InputFormat::Markdown
    } else {
        InputFormat::Json
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
