//! End-to-end exports through a real Chrome.
//!
//! Gated behind `HTML2PDF_E2E` so they only run where a browser is
//! installed:
//!   HTML2PDF_E2E=1 cargo test --test export -- --nocapture

use html2pdf::export::{self, ExportConfig};
use html2pdf::{BrowserSettings, Options};
use lopdf::Document;
use std::path::{Path, PathBuf};

macro_rules! e2e_skip_unless_ready {
    () => {
        if std::env::var("HTML2PDF_E2E").is_err() {
            println!("SKIP: set HTML2PDF_E2E=1 to run browser tests");
            return;
        }
    };
}

const PT_PER_MM: f64 = 72.0 / 25.4;

fn write_html(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("<!doctype html><html><body>{body}</body></html>")).unwrap();
    path
}

/// Body text carries no digits, so the only numbers on a page come from
/// the footer.
fn long_body(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|_| "<p>A paragraph of a long document that spills over several pages.</p>".to_string())
        .collect()
}

async fn export_with(args: Vec<String>) -> PathBuf {
    let options = Options::from_args(&args);
    let config = ExportConfig::from_options(&options, BrowserSettings::default()).unwrap();
    export::run(config).await.unwrap()
}

fn first_page_size_mm(doc: &Document) -> (f64, f64) {
    let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap();
    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    let number = |o: &lopdf::Object| o.as_float().map(f64::from).or_else(|_| o.as_i64().map(|i| i as f64)).unwrap();
    let width = number(&media_box[2]) - number(&media_box[0]);
    let height = number(&media_box[3]) - number(&media_box[1]);
    (width / PT_PER_MM, height / PT_PER_MM)
}

#[tokio::test]
async fn default_export_is_a_pdf() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    let input = write_html(dir.path(), "page.html", "<h1>Hello</h1>");
    let output = dir.path().join("output.pdf");

    let written = export_with(vec![
        format!("input={}", input.display()),
        format!("output={}", output.display()),
    ])
    .await;

    assert_eq!(written, output);
    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    let (width, height) = first_page_size_mm(&Document::load_mem(&bytes).unwrap());
    assert!((width - 297.0).abs() < 2.0, "A3 width {width}");
    assert!((height - 420.0).abs() < 2.0, "A3 height {height}");
}

#[tokio::test]
async fn a4_size_is_honoured() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    let input = write_html(dir.path(), "page.html", "<h1>Hello</h1>");
    let output = dir.path().join("a4.pdf");

    export_with(vec![
        format!("input={}", input.display()),
        format!("output={}", output.display()),
        "size=A4".to_string(),
    ])
    .await;

    let (width, height) = first_page_size_mm(&Document::load(&output).unwrap());
    assert!((width - 210.0).abs() < 2.0, "A4 width {width}");
    assert!((height - 297.0).abs() < 2.0, "A4 height {height}");
}

#[tokio::test]
async fn title_and_page_number_on_every_page() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    let input = write_html(dir.path(), "long.html", &long_body(300));
    let output = dir.path().join("titled.pdf");

    export_with(vec![
        format!("input={}", input.display()),
        format!("output={}", output.display()),
        "title=Report".to_string(),
        "size=A5".to_string(),
    ])
    .await;

    let doc = Document::load(&output).unwrap();
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    assert!(pages.len() > 1, "expected several pages, got {}", pages.len());

    for number in pages {
        let text = doc.extract_text(&[number]).unwrap();
        assert!(text.contains("Report"), "page {number} has no title: {text:?}");
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        assert!(compact.contains(&format!("第{number}页")), "page {number} has no page number: {text:?}");
        let digits: String = compact.chars().filter(char::is_ascii_digit).collect();
        assert_eq!(digits, number.to_string(), "page {number} has stray numbers: {text:?}");
    }
}

#[tokio::test]
async fn same_input_same_page_count() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    let input = write_html(dir.path(), "long.html", &long_body(120));

    let mut counts = Vec::new();
    for name in ["first.pdf", "second.pdf"] {
        let output = dir.path().join(name);
        export_with(vec![
            format!("input={}", input.display()),
            format!("output={}", output.display()),
        ])
        .await;
        counts.push(Document::load(&output).unwrap().get_pages().len());
    }

    assert_eq!(counts[0], counts[1]);
}

#[tokio::test]
async fn existing_output_is_overwritten() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    let input = write_html(dir.path(), "page.html", "<h1>Hello</h1>");
    let output = dir.path().join("output.pdf");
    std::fs::write(&output, "stale").unwrap();

    export_with(vec![
        format!("input={}", input.display()),
        format!("output={}", output.display()),
    ])
    .await;

    assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF-"));
}
