use anyhow::{Context, Result};
use clap::Parser;
use html2pdf::{export, BrowserSettings, ExportConfig, Options};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Converts a local HTML file to a PDF using a headless browser
///
/// Options are given as KEY=VALUE: input (default demo_custom.html),
/// output (default output.pdf), size (default A3), title, chrome, timeout.
#[derive(Parser, Debug)]
#[command(version, about, long_about)]
struct Args {
    /// Export options, e.g. input=report.html size=A4 title=Report
    #[arg(value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Browser executable; discovered when not given
    #[arg(long, env = "HTML2PDF_CHROME")]
    chrome: Option<PathBuf>,

    /// Seconds a browser step may take before the run fails
    #[arg(long, env = "HTML2PDF_TIMEOUT", default_value_t = 300,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Enable debug logs
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {

    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = Options::from_args(&args.options);
    let settings = BrowserSettings {
        executable: args.chrome,
        timeout: Duration::from_secs(args.timeout),
    };

    let config = ExportConfig::from_options(&options, settings)
        .context("Invalid export options")?;

    let input = config.input.clone();
    export::run(config)
        .await
        .with_context(|| format!("Can't convert '{}' to PDF", input.display()))?;

    Ok(())
}
