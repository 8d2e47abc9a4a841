use headless_chrome;
use headless_chrome::LaunchOptions;
use url::Url;
use thiserror::Error;
use crate::pdf::Page;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Bound on launch, navigation and printing.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("ChromeError: {0}")]
    ChromeError(#[from] anyhow::Error),
    #[error("Input file not found: '{}'", .0.display())]
    InputNotFound(PathBuf),
    #[error("Can't turn '{}' into a file:// URL", .0.display())]
    FileUrlError(PathBuf),
    #[error("Browser executable not found: '{}'", .0.display())]
    ExecutableNotFound(PathBuf),
    #[error("No browser executable found ({0}); pass --chrome <PATH> or set HTML2PDF_CHROME")]
    NoExecutable(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error)
}
pub type Result<T> = std::result::Result<T, BrowserError>;

/// Where the browser comes from and how long it may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSettings {
    /// Explicit executable. `None` falls back to discovery (`CHROME` env
    /// var, `PATH`, well-known install locations).
    pub executable: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self { executable: None, timeout: DEFAULT_TIMEOUT }
    }
}

impl BrowserSettings {

    pub fn resolve_executable(&self) -> Result<PathBuf> {

        match &self.executable {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(path) => Err(BrowserError::ExecutableNotFound(path.clone())),
            None => headless_chrome::browser::default_executable()
                .map_err(BrowserError::NoExecutable),
        }
    }
}

/// Resolves `path` against the working directory and builds its `file://`
/// URL. Fails when the file does not exist.
pub fn file_url(path: &Path) -> Result<Url> {

    let absolute = std::path::absolute(path)?;

    if !absolute.is_file() {
        return Err(BrowserError::InputNotFound(absolute));
    }

    Url::from_file_path(&absolute).map_err(|_| BrowserError::FileUrlError(absolute))
}

/// One browser process, owned by this value.
///
/// The process is killed when the value is dropped, so every exit path,
/// early returns through `?` included, releases it.
pub struct Browser {
    inner: headless_chrome::Browser,
    timeout: Duration,
}

impl Browser {

    pub fn launch(executable: PathBuf, timeout: Duration) -> Result<Self> {

        debug!(executable = %executable.display(), ?timeout, "launching browser");

        let options = LaunchOptions {
            path: Some(executable),
            idle_browser_timeout: timeout,
            ..Default::default()
        };

        let inner = headless_chrome::Browser::new(options)?;
        info!("browser launched");

        Ok(Self { inner, timeout })
    }

    /// Opens a tab on `url` and blocks until the engine reports the
    /// network as idle, or the timeout runs out.
    pub fn open(&self, url: &Url) -> Result<Page> {

        let tab = self.inner.new_tab()?;
        tab.set_default_timeout(self.timeout);
        debug!("page created");

        tab.navigate_to(url.as_str())?.wait_until_navigated()?;
        info!(url = %url, "navigated");

        Ok(Page::from_tab(tab))
    }

    pub fn close(self) {
        drop(self.inner);
        info!("browser closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_url_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>hi</p>").unwrap();

        let url = file_url(&path).unwrap();

        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/page.html"));
        assert_eq!(url.to_file_path().unwrap(), std::path::absolute(&path).unwrap());
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.html");

        let err = file_url(&path).unwrap_err();
        assert!(matches!(err, BrowserError::InputNotFound(_)));
    }

    #[test]
    fn directory_is_not_an_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(file_url(dir.path()), Err(BrowserError::InputNotFound(_))));
    }

    #[test]
    fn explicit_executable_must_exist() {
        let dir = tempfile::tempdir().unwrap();

        let settings = BrowserSettings {
            executable: Some(dir.path().join("chrome")),
            ..Default::default()
        };
        assert!(matches!(settings.resolve_executable(), Err(BrowserError::ExecutableNotFound(_))));

        let chrome = dir.path().join("chrome-bin");
        std::fs::write(&chrome, "").unwrap();
        let settings = BrowserSettings {
            executable: Some(chrome.clone()),
            ..Default::default()
        };
        assert_eq!(settings.resolve_executable().unwrap(), chrome);
    }

    #[test]
    fn default_settings() {
        let settings = BrowserSettings::default();
        assert_eq!(settings.executable, None);
        assert_eq!(settings.timeout, Duration::from_secs(300));
    }

    #[test]
    fn open_local_page() {
        if std::env::var("HTML2PDF_E2E").is_err() {
            println!("SKIP: set HTML2PDF_E2E=1 to run browser tests");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<html><body><h1>Hello</h1></body></html>").unwrap();

        let settings = BrowserSettings::default();
        let browser = Browser::launch(settings.resolve_executable().unwrap(), settings.timeout).unwrap();
        let page = browser.open(&file_url(&path).unwrap());
        assert!(page.is_ok());
        browser.close();
    }
}
