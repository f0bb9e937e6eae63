use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Error, Debug)]
pub enum ArchiveError {
    /// A listing row, ledger record or date did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {url}: HTTP status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The PDF engine is missing or exited abnormally.
    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("could not resolve '{href}' against {base}: {source}")]
    UrlResolution {
        href: String,
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Transport failures are fatal to a scan and skip the current entry when downloading.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}
