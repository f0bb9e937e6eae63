use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::StatusCode;

use crate::error::{ArchiveError, Result};
use crate::fetch::Fetch;
use crate::renderer::PdfRenderer;

pub mod fixtures;

pub const ARCHIVE_URL: &str = "http://blog.example/someone/arcv/";

/// Serves canned responses and remembers every URL requested.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Vec<u8>>,
    pub requests: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.to_string(), body.into());
        self
    }

    pub fn with_fixture(self, url: &str, fixture_name: &str) -> Self {
        self.with(url, fixtures::load_html_fixture(fixture_name))
    }

    pub fn requested(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|u| *u == url).count()
    }
}

impl Fetch for FakeFetcher {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.borrow_mut().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| ArchiveError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND,
            })
    }
}

/// What a [`FakeRenderer`] was asked to render.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderInput {
    Url(String),
    Html(String),
}

/// Writes a stub PDF for every request except the URLs it is told to fail on
/// (`-` fails every piped HTML render).
#[derive(Default)]
pub struct FakeRenderer {
    failing: HashSet<String>,
    /// Leave a truncated file behind when failing, like a crashed engine.
    pub partial_output_on_failure: bool,
    pub calls: RefCell<Vec<(RenderInput, PathBuf)>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn render(&self, input: RenderInput, key: &str, output: &Path) -> Result<()> {
        self.calls.borrow_mut().push((input, output.to_path_buf()));
        if self.failing.contains(key) {
            if self.partial_output_on_failure {
                fs::write(output, b"%PDF-1.4 trunc").unwrap();
            }
            return Err(ArchiveError::render("renderer exited with exit status: 1"));
        }
        fs::write(output, b"%PDF-1.4").unwrap();
        Ok(())
    }
}

impl PdfRenderer for FakeRenderer {
    fn render_url(&self, url: &str, output: &Path) -> Result<()> {
        self.render(RenderInput::Url(url.to_string()), url, output)
    }

    fn render_html(&self, html: &str, output: &Path) -> Result<()> {
        self.render(RenderInput::Html(html.to_string()), "-", output)
    }
}

/// Two archive pages followed by an empty one.
pub fn two_page_archive() -> FakeFetcher {
    FakeFetcher::new()
        .with_fixture(ARCHIVE_URL, "archive_page1")
        .with_fixture(&format!("{}?page=2", ARCHIVE_URL), "archive_page2")
        .with_fixture(&format!("{}?page=3", ARCHIVE_URL), "archive_empty")
}
