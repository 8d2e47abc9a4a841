use crate::browser::{self, Browser, BrowserError, BrowserSettings};
use crate::options::{Options, OptionsError};
use crate::pdf::{PaperFormat, PdfError, PrintSettings};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error("Export task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Everything one export run needs, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub print: PrintSettings,
    pub browser: BrowserSettings,
}

impl ExportConfig {

    /// Builds the config from command-line options. `browser` holds the
    /// values coming from flags and the environment; `chrome=` and
    /// `timeout=` tokens take precedence over them.
    pub fn from_options(options: &Options, browser: BrowserSettings) -> Result<Self> {

        let format: PaperFormat = options.size().parse()?;

        let browser = BrowserSettings {
            executable: options.chrome().or(browser.executable),
            timeout: options.timeout()?.unwrap_or(browser.timeout),
        };

        Ok(Self {
            input: options.input(),
            output: options.output(),
            print: PrintSettings::new(format, options.title()),
            browser,
        })
    }
}

/// Runs the whole export on the blocking pool and waits for it.
/// Returns the path of the written PDF.
pub async fn run(config: ExportConfig) -> Result<PathBuf> {
    tokio::task::spawn_blocking(move || export(&config)).await?
}

/// launch → open page → navigate → print → close, one step at a time.
///
/// The input and executable are checked before anything is launched, so a
/// missing input never leaves a browser or an output file behind.
pub fn export(config: &ExportConfig) -> Result<PathBuf> {

    let url = browser::file_url(&config.input)?;
    let executable = config.browser.resolve_executable()?;

    let browser = Browser::launch(executable, config.browser.timeout)?;
    let page = browser.open(&url)?;
    page.write_pdf(&config.print, &config.output)?;
    browser.close();

    info!(input = %config.input.display(), output = %config.output.display(), "export finished");
    Ok(config.output.clone())
}
