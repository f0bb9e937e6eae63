use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;

use crate::error::{ArchiveError, Result};

/// Blocking HTTP GET, the only transport the scanner and archiver need.
pub trait Fetch {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// Body decoded as UTF-8 regardless of what the server declares.
    fn get_text(&self, url: &str) -> Result<String> {
        let bytes = self.get_bytes(url)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// One client reused for the whole run.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// `None` disables the request timeout entirely.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ArchiveError::Transport {
                url: String::new(),
                source,
            })?;
        Ok(HttpFetcher { client })
    }
}

impl Fetch for HttpFetcher {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let transport = |source: reqwest::Error| ArchiveError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().map_err(transport)?;
        Ok(body.to_vec())
    }
}
