use log::{error, info, warn};

use crate::entry::DiscoveredEntry;
use crate::error::Result;
use crate::fetch::Fetch;
use crate::ledger::Ledger;
use crate::listing::ListingPage;

/// Page 1 is the archive URL itself; older pages add `?page=N`.
pub fn archive_page_url(archive_url: &str, page_no: usize) -> String {
    if page_no <= 1 {
        archive_url.to_string()
    } else {
        format!("{}?page={}", archive_url, page_no)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Keep paging past ledger hits until an empty page.
    pub to_exhaustion: bool,
    /// Stop after this many pages. `None` or `Some(0)` pages until exhaustion.
    pub max_pages: Option<usize>,
}

impl ScanOptions {
    /// Every page until an empty one, skipping entries already in the ledger.
    pub fn exhaustive() -> Self {
        ScanOptions {
            to_exhaustion: true,
            max_pages: None,
        }
    }
}

/// Walks the reverse-chronological archive index collecting entries missing from the ledger.
pub struct ArchiveScanner<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    ledger: &'a Ledger,
    archive_url: &'a str,
}

impl<'a, F: Fetch + ?Sized> ArchiveScanner<'a, F> {
    pub fn new(fetcher: &'a F, ledger: &'a Ledger, archive_url: &'a str) -> Self {
        ArchiveScanner {
            fetcher,
            ledger,
            archive_url,
        }
    }

    pub fn page_url(&self, page_no: usize) -> String {
        archive_page_url(self.archive_url, page_no)
    }

    /// Newest entries first, in the order the archive lists them.
    pub fn scan(&self, options: ScanOptions) -> Result<Vec<DiscoveredEntry>> {
        let mut result = Vec::new();
        let max_pages = options.max_pages.filter(|&max| max > 0);
        let mut page_no = 1;

        loop {
            if max_pages.is_some_and(|max| page_no > max) {
                info!("Stopping after {} pages", page_no - 1);
                break;
            }

            info!("Scanning archive page {}...", page_no);
            let html = self.fetcher.get_text(&self.page_url(page_no))?;
            let page = ListingPage::parse(&html);

            for row_error in page.errors() {
                error!("ERROR parsing archive row on page {}: {}", page_no, row_error);
            }

            if page.parsed_count() == 0 {
                if page.candidate_count() > 0 {
                    warn!(
                        "None of the {} rows on archive page {} could be parsed; treating it as the end of the archive (possible markup change)",
                        page.candidate_count(),
                        page_no
                    );
                } else {
                    info!("Archive page {} has no entries; archive exhausted", page_no);
                }
                break;
            }

            let mut finished = false;
            for row in page.parsed() {
                let entry = DiscoveredEntry::from(row);

                if !self.ledger.contains(&entry.url) {
                    result.push(entry);
                } else if !options.to_exhaustion {
                    info!("Reached previously archived entry {} ({})", entry.url, entry.date);
                    finished = true;
                    break;
                }
            }

            if finished {
                break;
            }

            page_no += 1;
        }

        Ok(result)
    }
}
