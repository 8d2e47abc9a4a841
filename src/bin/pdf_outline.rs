use anyhow::{Context, Result};
use clap::Parser;
use html2pdf::Options;
use html2pdf::outline::{self, OutlineConfig, Outcome};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Adds bookmarks to a PDF from the table of contents printed in it
///
/// Settings come from generate_pdf_outline.json (or config=PATH) and can be
/// overridden as KEY=VALUE: input, output, toc_pages (e.g. 1-2), offset.
/// Headings that can't be located are written to outline_errors.json; fix the
/// pages there and run again.
#[derive(Parser, Debug)]
#[command(version, about, long_about)]
struct Args {
    /// Settings, e.g. input=book.pdf toc_pages=1-2 output=with_outline.pdf offset=0
    #[arg(value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Enable debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg.chars().all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}

fn rerun_command() -> String {
    std::env::args()
        .map(|arg| shell_quote(&arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<ExitCode> {

    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = Options::from_args(&args.options);
    let config = OutlineConfig::load(&options).context("Can't load outline settings")?;
    let manual = Path::new(outline::MANUAL_JSON);

    let outcome = outline::generate(&config, manual)
        .with_context(|| format!("Can't add an outline to '{}'", config.input.display()))?;

    match outcome {
        Outcome::Written(count) => {
            println!("Wrote {} with {} bookmarks", config.output.display(), count);
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Unresolved(entries) => {
            println!("TOC check failed, these headings were not found in the body:");
            for entry in outline::unresolved(&entries) {
                println!("(error) [Level {} → Title: {} → Page {}]", entry.level, entry.title, entry.page);
            }
            println!();
            println!("Fix the pages in {} and run again:", manual.display());
            println!("{}", rerun_command());
            Ok(ExitCode::FAILURE)
        }
    }
}
