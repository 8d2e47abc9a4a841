//! Bookmarks for an exported PDF, derived from its printed table of contents.
//!
//! The TOC pages list numbered headings (`1.`, `1.2.`, `1.2.3.` …). Each
//! heading is looked up again in the body; the page where it appears becomes
//! the bookmark target. Headings that can't be found are written to a JSON
//! file so they can be fixed by hand and fed back in on the next run.

use crate::options::Options;
use lopdf::{Bookmark, Document, Object};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MANUAL_JSON: &str = "outline_errors.json";
pub const CONFIG_JSON: &str = "generate_pdf_outline.json";

const DEFAULT_TEXT_FORMAT: u32 = 0;
const BLACK_COLOR_RGB: [f32; 3] = [0f32; 3];

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(((\d+\.)+)\s*(.*))").expect("heading regex is valid"));

#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Missing setting '{0}' (give it as {0}=... or in the JSON config)")]
    MissingSetting(&'static str),
    #[error("Invalid offset '{0}'")]
    InvalidOffset(String),
    #[error("Invalid TOC page range '{0}', expected N or N-M")]
    InvalidRange(String),
    #[error("TOC pages {first}-{last} are outside the document ({pages} pages)")]
    RangeOutOfDocument { first: i64, last: i64, pages: usize },
    #[error("The document has no pages to bookmark")]
    NoPages,
    #[error("The outline built for the document is empty")]
    EmptyOutline,
}

pub type Result<T> = std::result::Result<T, OutlineError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> OutlineError + '_ {
    move |source| OutlineError::Io { path: path.display().to_string(), source }
}

type RawEntry = (u32, String, u32);

/// One TOC line. Serialized as `[level, title, page]`; page 0 means the
/// heading was not found in the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub struct TocEntry {
    pub level: u32,
    pub title: String,
    pub page: u32,
}

impl From<RawEntry> for TocEntry {
    fn from((level, title, page): RawEntry) -> Self {
        Self { level, title, page }
    }
}

impl From<TocEntry> for RawEntry {
    fn from(entry: TocEntry) -> Self {
        (entry.level, entry.title, entry.page)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    toc_pages: Option<String>,
    offset: Option<i64>,
}

/// Settings of one outline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// 1-based, inclusive, as printed.
    pub toc_pages: (u32, u32),
    /// Added to `toc_pages` to get physical pages.
    pub offset: i64,
}

impl OutlineConfig {

    /// Reads the JSON config at `config=` (default `generate_pdf_outline.json`),
    /// if present, then lets `input=`, `output=`, `toc_pages=` and `offset=`
    /// tokens override it.
    pub fn load(options: &Options) -> Result<Self> {

        let path = PathBuf::from(options.get("config").unwrap_or(CONFIG_JSON));

        let file = if path.is_file() {
            debug!(path = %path.display(), "reading outline config");
            let text = std::fs::read_to_string(&path).map_err(io_error(&path))?;
            serde_json::from_str(&text)?
        } else {
            ConfigFile::default()
        };

        let input = options.get("input").map(PathBuf::from).or(file.input)
            .ok_or(OutlineError::MissingSetting("input"))?;
        let output = options.get("output").map(PathBuf::from).or(file.output)
            .ok_or(OutlineError::MissingSetting("output"))?;
        let toc_pages = options.get("toc_pages").map(str::to_string).or(file.toc_pages)
            .ok_or(OutlineError::MissingSetting("toc_pages"))?;
        let offset = match options.get("offset") {
            Some(value) => value.trim().parse()
                .map_err(|_| OutlineError::InvalidOffset(value.to_string()))?,
            None => file.offset.unwrap_or(0),
        };

        Ok(Self {
            input,
            output,
            toc_pages: parse_toc_range(&toc_pages)?,
            offset,
        })
    }

    /// Zero-based physical page indices of the first and last TOC page.
    pub fn toc_indices(&self, page_count: usize) -> Result<(usize, usize)> {

        let (first, last) = self.toc_pages;
        let first = i64::from(first) - 1 + self.offset;
        let last = i64::from(last) - 1 + self.offset;

        let out_of_document = OutlineError::RangeOutOfDocument { first, last, pages: page_count };
        if first < 0 || last < first {
            return Err(out_of_document);
        }
        let (first, last) = (first as usize, last as usize);
        if last >= page_count {
            return Err(out_of_document);
        }
        Ok((first, last))
    }
}

/// `"3"` or `"1-2"`; only the first and last parts of the range count.
pub fn parse_toc_range(range: &str) -> Result<(u32, u32)> {

    let invalid = || OutlineError::InvalidRange(range.to_string());
    let parts: Vec<&str> = range.split('-').map(str::trim).collect();

    let first: u32 = parts.first().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let last: u32 = parts.last().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;

    if first == 0 || last < first {
        return Err(invalid());
    }
    Ok((first, last))
}

/// Removes surrounding whitespace and a trailing `一`, which text
/// extraction tends to pick up from dotted leaders.
pub fn clean_title(title: &str) -> String {
    let title = title.trim();
    title.strip_suffix('一').unwrap_or(title).to_string()
}

/// `(level, title)` if `line` starts with a numbered heading.
pub fn match_heading(line: &str) -> Option<(u32, String)> {
    let captures = HEADING.captures(line)?;
    let level = captures[2].matches('.').count() as u32;
    let title = clean_title(captures[1].trim());
    Some((level, title))
}

/// Headings listed on `pages[first..=last]`, in order, pages unresolved.
/// A title listed twice keeps its last position.
pub fn collect_toc(pages: &[String], first: usize, last: usize) -> Vec<TocEntry> {

    let mut entries: Vec<TocEntry> = Vec::new();

    for text in pages.iter().take(last + 1).skip(first) {
        for (level, title) in text.lines().filter_map(match_heading) {
            entries.retain(|entry| entry.title != title);
            entries.push(TocEntry { level, title, page: 0 });
        }
    }

    entries
}

/// Finds each entry's heading on the pages after `toc_last` and records the
/// 1-based page it was last seen on.
pub fn resolve_pages(entries: &mut [TocEntry], pages: &[String], toc_last: usize) {

    for (index, text) in pages.iter().enumerate().skip(toc_last + 1) {
        for (_, title) in text.lines().filter_map(match_heading) {
            if let Some(entry) = entries.iter_mut().find(|entry| entry.title == title) {
                entry.page = index as u32 + 1;
            }
        }
    }
}

pub fn unresolved(entries: &[TocEntry]) -> Vec<&TocEntry> {
    entries.iter().filter(|entry| entry.page == 0).collect()
}

/// The hand-corrected list, if one has been saved at `path`.
pub fn load_manual(path: &Path) -> Result<Option<Vec<TocEntry>>> {

    if !path.is_file() {
        return Ok(None);
    }

    let text = std::fs::read_to_string(path).map_err(io_error(path))?;
    Ok(Some(serde_json::from_str(&text)?))
}

pub fn write_manual(path: &Path, entries: &[TocEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, json).map_err(io_error(path))?;
    Ok(())
}

/// Text of every page, in order. A page whose text can't be extracted
/// counts as empty.
pub fn extract_page_texts(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .keys()
        .map(|&number| match doc.extract_text(&[number]) {
            Ok(text) => text,
            Err(err) => {
                warn!(page = number, %err, "can't extract page text");
                String::new()
            }
        })
        .collect()
}

/// 1-based page a bookmark lands on: `page` clamped to the document.
pub fn target_page(page: u32, page_count: usize) -> u32 {
    let last = u32::try_from(page_count).unwrap_or(u32::MAX).max(1);
    page.clamp(1, last)
}

/// Replaces the document outline with one bookmark per entry, nested by level.
/// Pages outside the document are clamped to its first or last page. An empty
/// list leaves the document untouched.
pub fn apply_outline(doc: &mut Document, entries: &[TocEntry]) -> Result<()> {

    if entries.is_empty() {
        debug!("no TOC entries, outline left as is");
        return Ok(());
    }

    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(OutlineError::NoPages);
    }
    // (level, bookmark id) of the open ancestors
    let mut parents: Vec<(u32, u32)> = Vec::new();

    for entry in entries {
        let page = target_page(entry.page, pages.len());
        if page != entry.page {
            warn!(title = %entry.title, page = entry.page, target = page, "bookmark page outside the document");
        }
        let page_id = *pages.get(&page).ok_or(OutlineError::NoPages)?;

        while parents.last().is_some_and(|&(level, _)| level >= entry.level) {
            parents.pop();
        }
        let parent = parents.last().map(|&(_, id)| id);

        let bookmark = Bookmark::new(entry.title.clone(), BLACK_COLOR_RGB, DEFAULT_TEXT_FORMAT, page_id);
        let id = doc.add_bookmark(bookmark, parent);
        parents.push((entry.level, id));
    }

    let outlines_id = doc.build_outline().ok_or(OutlineError::EmptyOutline)?;
    let catalog = doc.catalog_mut()?;
    catalog.set("Outlines", Object::Reference(outlines_id));
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

    Ok(())
}

/// What an outline run ended with.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Bookmarks written to the output file.
    Written(usize),
    /// Some headings were not found; the full list went to the manual file.
    Unresolved(Vec<TocEntry>),
}

/// Loads the input, builds (or reads back) the TOC, and writes the
/// bookmarked copy.
pub fn generate(config: &OutlineConfig, manual_path: &Path) -> Result<Outcome> {

    let mut doc = Document::load(&config.input)?;

    let entries = match load_manual(manual_path)? {
        Some(entries) => {
            info!(path = %manual_path.display(), entries = entries.len(), "using hand-corrected TOC");
            entries
        }
        None => {
            let texts = extract_page_texts(&doc);
            let (first, last) = config.toc_indices(texts.len())?;
            let mut entries = collect_toc(&texts, first, last);
            resolve_pages(&mut entries, &texts, last);
            info!(entries = entries.len(), toc_first = first + 1, toc_last = last + 1, "TOC collected");

            if !unresolved(&entries).is_empty() {
                write_manual(manual_path, &entries)?;
                return Ok(Outcome::Unresolved(entries));
            }
            entries
        }
    };

    apply_outline(&mut doc, &entries)?;

    info!(path = %config.output.display(), bookmarks = entries.len(), "saving PDF with outline");
    doc.compress();
    doc.save(&config.output)?;

    Ok(Outcome::Written(entries.len()))
}
