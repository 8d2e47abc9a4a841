use std::collections::HashMap;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_INPUT: &str = "demo_custom.html";
pub const DEFAULT_OUTPUT: &str = "output.pdf";
pub const DEFAULT_SIZE: &str = "A3";
pub const DEFAULT_TITLE: &str = "📘 文档标题";

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Invalid timeout '{value}': {source}")]
    InvalidTimeout {
        value: String,
        source: ParseIntError,
    },
    #[error("Timeout must be at least one second")]
    ZeroTimeout,
}

pub type Result<T> = std::result::Result<T, OptionsError>;

/// Command-line options given as `key=value` tokens.
///
/// Parsing never fails: a token without `=` is kept with no value and
/// unknown keys are kept and ignored. Defaults are applied by the accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(HashMap<String, Option<String>>);

impl Options {

    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let map = args
            .into_iter()
            .map(|arg| match arg.as_ref().split_once('=') {
                Some((key, value)) => (key.to_string(), Some(value.to_string())),
                None => (arg.as_ref().to_string(), None),
            })
            .collect();

        Self(map)
    }

    /// Value for `key`, if one was given and it is not empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|value| value.as_deref())
            .filter(|value| !value.is_empty())
    }

    pub fn input(&self) -> PathBuf {
        PathBuf::from(self.get("input").unwrap_or(DEFAULT_INPUT))
    }

    pub fn output(&self) -> PathBuf {
        PathBuf::from(self.get("output").unwrap_or(DEFAULT_OUTPUT))
    }

    pub fn size(&self) -> &str {
        self.get("size").unwrap_or(DEFAULT_SIZE)
    }

    pub fn title(&self) -> &str {
        self.get("title").unwrap_or(DEFAULT_TITLE)
    }

    pub fn chrome(&self) -> Option<PathBuf> {
        self.get("chrome").map(PathBuf::from)
    }

    /// `timeout=<seconds>`, if given.
    pub fn timeout(&self) -> Result<Option<Duration>> {

        let Some(value) = self.get("timeout") else {
            return Ok(None);
        };

        let secs: u64 = value
            .trim()
            .parse()
            .map_err(|source| OptionsError::InvalidTimeout { value: value.to_string(), source })?;

        if secs == 0 {
            return Err(OptionsError::ZeroTimeout);
        }

        Ok(Some(Duration::from_secs(secs)))
    }
}
