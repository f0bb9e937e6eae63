pub mod archiver;
pub mod config;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod html;
pub mod ledger;
pub mod listing;
pub mod naming;
pub mod renderer;
pub mod scanner;
pub mod session;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier access
pub use crate::archiver::{EntryArchiver, PdfSource};
pub use crate::config::Config;
pub use crate::entry::DiscoveredEntry;
pub use crate::error::{ArchiveError, Result};
pub use crate::fetch::{Fetch, HttpFetcher};
pub use crate::ledger::{Ledger, LedgerRecord};
pub use crate::listing::{ListingPage, ListingRow, RowError};
pub use crate::renderer::{PdfRenderer, Wkhtmltopdf};
pub use crate::scanner::{ArchiveScanner, ScanOptions};
pub use crate::session::{DownloadReport, RunOutcome, RunState, Session};
