//! Print local HTML files to PDF with a headless Chrome, and add bookmarks
//! to the result.
//!
//! ```text
//! options ──► ExportConfig ──► launch ──► open file:// ──► print ──► close
//! ```
//!
//! The browser process is owned by [`browser::Browser`] and goes away with
//! it, whichever way the run ends.

pub mod browser;
pub mod export;
pub mod options;
pub mod outline;
pub mod pdf;

pub use browser::{Browser, BrowserSettings};
pub use export::{ExportConfig, ExportError};
pub use options::Options;
pub use pdf::{PaperFormat, PrintSettings};
