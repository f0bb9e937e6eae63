use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use url::Url;

use crate::entry::DiscoveredEntry;
use crate::error::{ArchiveError, Result};
use crate::fetch::Fetch;
use crate::html::{absolutize_root_relative, image_file_name, jpeg_references, localize_reference};
use crate::naming::{ensure_dir, next_free_dir, next_free_file, next_free_index};
use crate::renderer::PdfRenderer;

/// What the PDF engine is given for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PdfSource {
    /// The engine fetches the entry URL itself.
    #[default]
    Url,
    /// The page is fetched here, rewritten, and piped to the engine.
    Html,
}

/// Writes PDF files and HTML snapshots for discovered entries.
pub struct EntryArchiver<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    renderer: Option<&'a dyn PdfRenderer>,
    base_url: &'a Url,
    pdf_dir: &'a Path,
    html_dir: &'a Path,
    pdf_source: PdfSource,
}

impl<'a, F: Fetch + ?Sized> EntryArchiver<'a, F> {
    pub fn new(
        fetcher: &'a F,
        renderer: Option<&'a dyn PdfRenderer>,
        base_url: &'a Url,
        pdf_dir: &'a Path,
        html_dir: &'a Path,
    ) -> Self {
        EntryArchiver {
            fetcher,
            renderer,
            base_url,
            pdf_dir,
            html_dir,
            pdf_source: PdfSource::default(),
        }
    }

    pub fn with_pdf_source(mut self, pdf_source: PdfSource) -> Self {
        self.pdf_source = pdf_source;
        self
    }

    /// Renders the entry to `<pdf_dir>/<yyyymmdd>[-n].pdf` and returns that path.
    pub fn archive_as_pdf(&self, entry: &DiscoveredEntry) -> Result<PathBuf> {
        let renderer = self
            .renderer
            .ok_or_else(|| ArchiveError::render("no PDF renderer available"))?;

        // Fetch before claiming a file name so a transport failure leaves nothing behind.
        let html = match self.pdf_source {
            PdfSource::Url => None,
            PdfSource::Html => {
                let html = self.fetcher.get_text(&entry.url)?;
                Some(absolutize_root_relative(&html, self.base_url))
            }
        };

        ensure_dir(self.pdf_dir)?;
        let output = next_free_file(self.pdf_dir, &entry.file_stem(), "pdf");
        debug!("Rendering {} to {}", entry.url, output.display());

        let rendered = match &html {
            None => renderer.render_url(&entry.url, &output),
            Some(html) => renderer.render_html(html, &output),
        };

        if let Err(e) = rendered {
            if output.exists() {
                if let Err(remove_err) = fs::remove_file(&output) {
                    warn!("Could not remove partial PDF {}: {}", output.display(), remove_err);
                }
            }
            return Err(e);
        }

        Ok(output)
    }

    /// Saves the entry page with localized JPEG images under `<html_dir>/<yyyymmdd>[-n]/`.
    /// Returns the written HTML file.
    pub fn archive_as_html(&self, entry: &DiscoveredEntry) -> Result<PathBuf> {
        let raw = self.fetcher.get_bytes(&entry.url)?;
        let mut html = absolutize_root_relative(&String::from_utf8_lossy(&raw), self.base_url);

        ensure_dir(self.html_dir)?;
        let snapshot_dir = next_free_dir(self.html_dir, &entry.file_stem());
        fs::create_dir(&snapshot_dir).map_err(|e| ArchiveError::io(&snapshot_dir, e))?;

        let entry_url = Url::parse(&entry.url).ok();
        for reference in jpeg_references(&html) {
            match self.localize_image(&reference, entry_url.as_ref(), &snapshot_dir) {
                Ok(file_name) => html = localize_reference(&html, &reference, &file_name),
                Err(e) => warn!("Keeping remote image {} for {}: {}", reference, entry.date, e),
            }
        }

        let index = next_free_index(&snapshot_dir);
        fs::write(&index, html).map_err(|e| ArchiveError::io(&index, e))?;
        Ok(index)
    }

    /// Downloads one image into `snapshot_dir` unless already present; returns its file name.
    fn localize_image(&self, reference: &str, entry_url: Option<&Url>, snapshot_dir: &Path) -> Result<String> {
        let href = reference.replace("&amp;", "&");
        let image_url = Url::parse(&href).or_else(|_| {
            entry_url
                .unwrap_or(self.base_url)
                .join(&href)
                .map_err(|source| ArchiveError::UrlResolution {
                    href: href.clone(),
                    base: self.base_url.to_string(),
                    source,
                })
        })?;

        let file_name = image_file_name(&image_url)
            .ok_or_else(|| ArchiveError::parse(format!("no file name in image URL {}", image_url)))?;
        let path = snapshot_dir.join(&file_name);

        if !path.exists() {
            let bytes = self.fetcher.get_bytes(image_url.as_str())?;
            fs::write(&path, bytes).map_err(|e| ArchiveError::io(&path, e))?;
            info!("Saved image {}", path.display());
        }

        Ok(file_name)
    }
}
