use headless_chrome;
use headless_chrome::types::PrintToPdfOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Unknown paper format: {0}")]
    UnknownFormat(String),
    #[error("Browser Error: {0}")]
    BrowserError(#[from] anyhow::Error),
    #[error("Can't write PDF to '{path}': {source}")]
    WriteError {
        path: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PdfError>;

const PX_PER_INCH: f64 = 96.0;

pub const MARGIN_TOP_PX: f64 = 60.0;
pub const MARGIN_BOTTOM_PX: f64 = 60.0;
pub const MARGIN_LEFT_PX: f64 = 40.0;
pub const MARGIN_RIGHT_PX: f64 = 40.0;

/// Paper sizes the browser engine knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

impl PaperFormat {

    /// Width and height in inches, portrait.
    pub fn inches(&self) -> (f64, f64) {
        match self {
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
            PaperFormat::Ledger => (17.0, 11.0),
            PaperFormat::A0 => (33.1, 46.8),
            PaperFormat::A1 => (23.4, 33.1),
            PaperFormat::A2 => (16.54, 23.4),
            PaperFormat::A3 => (11.7, 16.54),
            PaperFormat::A4 => (8.27, 11.7),
            PaperFormat::A5 => (5.83, 8.27),
            PaperFormat::A6 => (4.13, 5.83),
        }
    }
}

impl FromStr for PaperFormat {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        let format = match s.trim().to_ascii_lowercase().as_str() {
            "letter" => PaperFormat::Letter,
            "legal" => PaperFormat::Legal,
            "tabloid" => PaperFormat::Tabloid,
            "ledger" => PaperFormat::Ledger,
            "a0" => PaperFormat::A0,
            "a1" => PaperFormat::A1,
            "a2" => PaperFormat::A2,
            "a3" => PaperFormat::A3,
            "a4" => PaperFormat::A4,
            "a5" => PaperFormat::A5,
            "a6" => PaperFormat::A6,
            _ => return Err(PdfError::UnknownFormat(s.to_string())),
        };
        Ok(format)
    }
}

fn px_to_inches(px: f64) -> f64 {
    px / PX_PER_INCH
}

/// What goes into the print call besides the page itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintSettings {
    pub format: PaperFormat,
    pub title: String,
}

impl PrintSettings {

    pub fn new(format: PaperFormat, title: impl Into<String>) -> Self {
        Self { format, title: title.into() }
    }

    pub fn header_template(&self) -> String {
        format!(
            r#"<div style="font-size:10px; text-align:left; width:100%;padding-left:20px;"><span>{}</span></div>"#,
            self.title
        )
    }

    pub fn footer_template(&self) -> String {
        r#"<div style="font-size:10px; text-align:right; width:100%; padding-right:20px;"><span>第 <span class="pageNumber"></span> 页</span></div>"#
            .to_string()
    }

    pub fn to_options(&self) -> PrintToPdfOptions {
        let (paper_width, paper_height) = self.format.inches();

        PrintToPdfOptions {
            display_header_footer: Some(true),
            print_background: Some(true),
            paper_width: Some(paper_width),
            paper_height: Some(paper_height),
            margin_top: Some(px_to_inches(MARGIN_TOP_PX)),
            margin_bottom: Some(px_to_inches(MARGIN_BOTTOM_PX)),
            margin_left: Some(px_to_inches(MARGIN_LEFT_PX)),
            margin_right: Some(px_to_inches(MARGIN_RIGHT_PX)),
            header_template: Some(self.header_template()),
            footer_template: Some(self.footer_template()),
            ..Default::default()
        }
    }
}

/// A navigated tab, ready to be printed.
pub struct Page (Arc<headless_chrome::Tab>);

impl Page {

    pub fn from_tab(tab: Arc<headless_chrome::Tab>) -> Self {
        Self(tab)
    }

    pub fn to_pdf(&self, settings: &PrintSettings) -> Result<Vec<u8>> {
        debug!(format = ?settings.format, title = %settings.title, "printing page");
        let pdf = self.0.print_to_pdf(Some(settings.to_options()))?;
        Ok(pdf)
    }

    /// Prints the page and writes it to `path`, replacing any existing file.
    /// Returns the number of bytes written.
    pub fn write_pdf(&self, settings: &PrintSettings, path: &Path) -> Result<usize> {

        let pdf = self.to_pdf(settings)?;

        std::fs::write(path, &pdf).map_err(|source| PdfError::WriteError {
            path: path.display().to_string(),
            source,
        })?;

        info!(path = %path.display(), bytes = pdf.len(), "PDF written");
        Ok(pdf.len())
    }
}
