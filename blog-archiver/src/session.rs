use log::{debug, error, info};
use serde::Serialize;

use crate::archiver::EntryArchiver;
use crate::config::Config;
use crate::entry::DiscoveredEntry;
use crate::error::Result;
use crate::fetch::Fetch;
use crate::ledger::Ledger;
use crate::renderer::PdfRenderer;
use crate::scanner::ArchiveScanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Scanning,
    NoUpdates,
    AwaitingConfirmation,
    Downloading,
    Finished,
}

#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    NoUpdates,
    Declined { discovered: usize },
    Finished(DownloadReport),
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DownloadReport {
    pub html_saved: usize,
    pub html_failed: usize,
    pub pdf_saved: usize,
    pub pdf_failed: usize,
    /// Records appended to the ledger during this run, in order.
    pub archived: Vec<String>,
}

/// One scan-then-download run against a blog.
pub struct Session<'a, F: Fetch + ?Sized> {
    config: &'a Config,
    fetcher: &'a F,
    renderer: Option<&'a dyn PdfRenderer>,
    ledger: Ledger,
    state: RunState,
}

impl<'a, F: Fetch + ?Sized> Session<'a, F> {
    pub fn new(
        config: &'a Config,
        fetcher: &'a F,
        renderer: Option<&'a dyn PdfRenderer>,
        ledger: Ledger,
    ) -> Self {
        Session {
            config,
            fetcher,
            renderer,
            ledger,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn transition(&mut self, state: RunState) {
        debug!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Entries missing from the ledger, newest first. Never modifies the ledger.
    pub fn scan(&self) -> Result<Vec<DiscoveredEntry>> {
        let archive_url = self.config.archive_url();
        ArchiveScanner::new(self.fetcher, &self.ledger, &archive_url).scan(self.config.scan)
    }

    /// Scans, asks `confirm` whether to continue, then downloads everything found.
    pub fn run<C>(&mut self, confirm: C) -> Result<RunOutcome>
    where
        C: FnOnce(&[DiscoveredEntry]) -> bool,
    {
        self.transition(RunState::Scanning);
        let entries = match self.scan() {
            Ok(entries) => entries,
            Err(e) => {
                self.transition(RunState::Idle);
                return Err(e);
            }
        };

        if entries.is_empty() {
            self.transition(RunState::NoUpdates);
            return Ok(RunOutcome::NoUpdates);
        }

        self.transition(RunState::AwaitingConfirmation);
        if !confirm(&entries) {
            info!("Download of {} entries declined", entries.len());
            self.transition(RunState::Idle);
            return Ok(RunOutcome::Declined {
                discovered: entries.len(),
            });
        }

        let report = self.download(&entries);
        Ok(RunOutcome::Finished(report))
    }

    /// Archives each entry in order. HTML first, then PDF; only a PDF success extends the ledger.
    pub fn download(&mut self, entries: &[DiscoveredEntry]) -> DownloadReport {
        self.transition(RunState::Downloading);

        let config = self.config;
        let archiver = EntryArchiver::new(
            self.fetcher,
            self.renderer,
            &config.base_url,
            &config.pdf_dir,
            &config.html_dir,
        )
        .with_pdf_source(config.pdf_source);

        let mut report = DownloadReport::default();

        for entry in entries {
            if !config.skip_html {
                match archiver.archive_as_html(entry) {
                    Ok(path) => {
                        report.html_saved += 1;
                        info!("SUCCESS downloading HTML {} to {}", entry.date, path.display());
                    }
                    Err(e) => {
                        report.html_failed += 1;
                        error!("ERROR downloading HTML page {} with url {}: {}", entry.date, entry.url, e);
                    }
                }
            }

            if config.skip_pdf {
                continue;
            }

            match archiver.archive_as_pdf(entry) {
                Ok(path) => {
                    report.pdf_saved += 1;
                    info!("SUCCESS downloading PDF {} to {}", entry.date, path.display());

                    let record = entry.to_record();
                    match self.ledger.append(&record) {
                        Ok(()) => report.archived.push(record),
                        Err(e) => error!("ERROR recording {} in the ledger: {}", entry.date, e),
                    }
                }
                Err(e) => {
                    report.pdf_failed += 1;
                    error!("ERROR downloading/creating PDF {} with url {}: {}", entry.date, entry.url, e);
                }
            }
        }

        self.transition(RunState::Finished);
        report
    }
}
