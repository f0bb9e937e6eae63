use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::error::{ArchiveError, Result};

/// Append-only list of already archived entries, one `"<url> <date> <title>"` line each.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    records: Vec<String>,
}

/// A ledger line split into its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRecord {
    pub url: String,
    pub date: String,
    pub title: String,
}

impl LedgerRecord {
    pub fn parse(line: &str) -> Result<Self> {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(url), Some(date)) => {
                let title = fields.collect::<Vec<_>>().join(" ");
                if title.is_empty() {
                    return Err(ArchiveError::parse(format!(
                        "ledger record has fewer than 3 fields: '{}'",
                        line
                    )));
                }
                Ok(LedgerRecord {
                    url: url.to_string(),
                    date: date.to_string(),
                    title,
                })
            }
            _ => Err(ArchiveError::parse(format!(
                "ledger record has fewer than 3 fields: '{}'",
                line
            ))),
        }
    }
}

impl Ledger {
    /// Reads every record from `path`. A missing file is the empty ledger and gets created.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            info!("Ledger {} does not exist. Creating.", path.display());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
            }
            fs::File::create(&path).map_err(|e| ArchiveError::io(&path, e))?;
            return Ok(Ledger {
                path,
                records: Vec::new(),
            });
        }

        let contents = fs::read_to_string(&path).map_err(|e| ArchiveError::io(&path, e))?;
        let records = contents
            .trim_start_matches('\u{feff}')
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>();

        info!("Loaded {} ledger records from {}", records.len(), path.display());
        Ok(Ledger { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// True if some record's URL is a prefix of (or equal to) `candidate_url`.
    pub fn contains(&self, candidate_url: &str) -> bool {
        self.records
            .iter()
            .filter_map(|record| record.split_whitespace().next())
            .any(|url| candidate_url.starts_with(url))
    }

    /// Parses every record, logging and skipping the malformed ones.
    pub fn parsed_records(&self) -> Vec<LedgerRecord> {
        self.records
            .iter()
            .filter_map(|line| match LedgerRecord::parse(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    error!("Skipping ledger record: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Persists exactly one new line at the end of the file, then records it in memory.
    pub fn append(&mut self, record: &str) -> Result<()> {
        let record = record.replace(['\r', '\n'], " ");

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ArchiveError::io(&self.path, e))?;

        // A hand-edited last line may lack its terminator
        let line = if ends_unterminated(&mut file).map_err(|e| ArchiveError::io(&self.path, e))? {
            format!("\n{}\n", record)
        } else {
            format!("{}\n", record)
        };
        file.write_all(line.as_bytes())
            .map_err(|e| ArchiveError::io(&self.path, e))?;
        file.sync_data().map_err(|e| ArchiveError::io(&self.path, e))?;

        self.records.push(record);
        Ok(())
    }
}

fn ends_unterminated(file: &mut fs::File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("previous_downloads.txt");

        let ledger = Ledger::load(&path).unwrap();
        assert!(ledger.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn test_prefix_membership() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.txt");
        fs::write(&path, "http://blog.example/e/abc/ 2016-10-29 Party\n").unwrap();

        let ledger = Ledger::load(&path).unwrap();
        assert!(ledger.contains("http://blog.example/e/abc/"));
        assert!(ledger.contains("http://blog.example/e/abc/?utm=1"));
        assert!(ledger.contains("http://blog.example/e/abc/#comments"));
        assert!(!ledger.contains("http://blog.example/e/abd/"));
        assert!(!ledger.contains("http://blog.example/e/"));
    }

    #[test]
    fn test_blank_lines_do_not_match_everything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.txt");
        fs::write(&path, "\r\n   \n").unwrap();

        let ledger = Ledger::load(&path).unwrap();
        assert!(ledger.is_empty());
        assert!(!ledger.contains("http://blog.example/e/abc/"));
    }

    #[test]
    fn test_append_keeps_prior_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.txt");
        fs::write(&path, "http://blog.example/e/a/ 2016-10-20 First\n").unwrap();

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.append("http://blog.example/e/b/ 2016-10-29 Second").unwrap();
        assert_eq!(ledger.len(), 2);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "http://blog.example/e/a/ 2016-10-20 First\nhttp://blog.example/e/b/ 2016-10-29 Second\n"
        );

        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.records(), ledger.records());
        assert!(reloaded.contains("http://blog.example/e/b/"));
    }

    #[test]
    fn test_append_after_unterminated_last_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.txt");
        fs::write(&path, "http://blog.example/e/a/ 2016-10-20 First").unwrap();

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.append("http://blog.example/e/b/ 2016-10-29 Second").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "http://blog.example/e/a/ 2016-10-20 First\nhttp://blog.example/e/b/ 2016-10-29 Second\n"
        );
        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.records(), ledger.records());
        assert!(reloaded.contains("http://blog.example/e/b/"));
    }

    #[test]
    fn test_record_parsing() {
        let record = LedgerRecord::parse("http://blog.example/e/a/ 2016-10-20 A long  title").unwrap();
        assert_eq!(record.url, "http://blog.example/e/a/");
        assert_eq!(record.date, "2016-10-20");
        assert_eq!(record.title, "A long title");

        assert!(LedgerRecord::parse("http://blog.example/e/a/ 2016-10-20").is_err());
        assert!(LedgerRecord::parse("http://blog.example/e/a/").is_err());
    }

    #[test]
    fn test_parsed_records_skip_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.txt");
        fs::write(
            &path,
            "http://blog.example/e/a/ 2016-10-20 First\nhttp://blog.example/e/b/\n",
        )
        .unwrap();

        let ledger = Ledger::load(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        let parsed = ledger.parsed_records();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "First");
    }
}
