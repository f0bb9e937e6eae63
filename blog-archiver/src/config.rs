use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::archiver::PdfSource;
use crate::error::{ArchiveError, Result};
use crate::scanner::ScanOptions;

pub const DEFAULT_BASE_URL: &str = "http://blog.goo.ne.jp/";
pub const DEFAULT_BLOG_URL: &str = "http://blog.goo.ne.jp/guldfisk";
pub const DEFAULT_LEDGER: &str = "previous_downloads.txt";
pub const DEFAULT_PDF_DIR: &str = "output";
pub const DEFAULT_HTML_DIR: &str = "webpages";
pub const DEFAULT_RENDERER: &str = "wkhtmltopdf";

/// Settings for one run, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root that `src="/..."` and `href="/..."` are resolved against.
    pub base_url: Url,
    /// Blog root, always ending in `/`.
    pub blog_url: String,
    pub ledger_path: PathBuf,
    pub pdf_dir: PathBuf,
    pub html_dir: PathBuf,
    /// Executable names (looked up on PATH) or paths, tried in order.
    pub renderer_candidates: Vec<String>,
    pub pdf_source: PdfSource,
    pub timeout: Option<Duration>,
    pub scan: ScanOptions,
    pub skip_html: bool,
    pub skip_pdf: bool,
}

impl Config {
    pub fn new(base_url: &str, blog_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ArchiveError::parse(format!("invalid base URL '{}': {}", base_url, e)))?;
        let blog_url = Url::parse(blog_url)
            .map_err(|e| ArchiveError::parse(format!("invalid blog URL '{}': {}", blog_url, e)))?;

        let mut blog_url = blog_url.to_string();
        if !blog_url.ends_with('/') {
            blog_url.push('/');
        }

        Ok(Config {
            base_url,
            blog_url,
            ledger_path: PathBuf::from(DEFAULT_LEDGER),
            pdf_dir: PathBuf::from(DEFAULT_PDF_DIR),
            html_dir: PathBuf::from(DEFAULT_HTML_DIR),
            renderer_candidates: vec![DEFAULT_RENDERER.to_string()],
            pdf_source: PdfSource::default(),
            timeout: None,
            scan: ScanOptions::exhaustive(),
            skip_html: false,
            skip_pdf: false,
        })
    }

    /// First page of the archive index.
    pub fn archive_url(&self) -> String {
        format!("{}arcv/", self.blog_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_BASE_URL, DEFAULT_BLOG_URL).expect("valid default URLs")
    }
}
