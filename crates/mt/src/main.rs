//! mkdocs-translate CLI.
//!
//! Provides commands for:
//! - `init`: Copy images and other assets from the rst folder into the docs folder
//! - `scan`: Build the anchor index and download manifests
//! - `nav`: Print the MkDocs navigation built from toctrees
//! - `migrate`: Convert rst files to Markdown
//! - `french`: Translate a Markdown page end to end
//! - `internal-html`, `internal-markdown`, `internal-document`: single translation steps

mod commands;
mod discover;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    FrenchArgs, InitArgs, InternalDocumentArgs, InternalHtmlArgs, InternalMarkdownArgs,
    MigrateArgs, NavArgs, ScanArgs,
};
use output::Output;

/// mkdocs-translate - migrate Sphinx documentation to MkDocs and translate it.
#[derive(Parser)]
#[command(name = "mkdocs-translate", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover translate.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive (default: RUST_LOG, otherwise info).
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy images and files from the rst folder into the docs folder.
    Init(InitArgs),
    /// Scan rst files collecting anchors and downloads.
    Scan(ScanArgs),
    /// Print the navigation tree built from toctree directives.
    Nav(NavArgs),
    /// Convert rst files to Markdown.
    Migrate(MigrateArgs),
    /// Translate a Markdown file to French.
    French(FrenchArgs),
    /// Convert a Markdown file to HTML for translation.
    InternalHtml(InternalHtmlArgs),
    /// Convert a translated HTML file back to Markdown.
    InternalMarkdown(InternalMarkdownArgs),
    /// Upload an HTML file for translation and download the result.
    InternalDocument(InternalDocumentArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --log takes precedence, otherwise use RUST_LOG or default to INFO
    let filter = match &cli.log {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Init(args) => args.execute(config),
        Commands::Scan(args) => args.execute(config),
        Commands::Nav(args) => args.execute(config),
        Commands::Migrate(args) => args.execute(config),
        Commands::French(args) => args.execute(config),
        Commands::InternalHtml(args) => args.execute(config),
        Commands::InternalMarkdown(args) => args.execute(config),
        Commands::InternalDocument(args) => args.execute(config),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
