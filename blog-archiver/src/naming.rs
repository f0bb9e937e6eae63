//! Collision-free output names: `20161029.pdf`, `20161029-2.pdf`, `20161029-3.pdf`, ...

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ArchiveError, Result};

pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path).map_err(|e| ArchiveError::io(path, e))
}

/// First of `<stem>.<ext>`, `<stem>-2.<ext>`, ... that does not exist in `dir`.
pub fn next_free_file(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    next_free(dir, |index| match index {
        1 => format!("{}.{}", stem, extension),
        n => format!("{}-{}.{}", stem, n, extension),
    })
}

/// First of `<stem>`, `<stem>-2`, ... that does not exist in `dir`.
pub fn next_free_dir(dir: &Path, stem: &str) -> PathBuf {
    next_free(dir, |index| match index {
        1 => stem.to_string(),
        n => format!("{}-{}", stem, n),
    })
}

/// `index.html`, then `index(2).html`, `index(3).html`, ...
pub fn next_free_index(dir: &Path) -> PathBuf {
    next_free(dir, |index| match index {
        1 => "index.html".to_string(),
        n => format!("index({}).html", n),
    })
}

fn next_free<F: Fn(usize) -> String>(dir: &Path, name: F) -> PathBuf {
    (1..)
        .map(|index| dir.join(name(index)))
        .find(|path| !path.exists())
        .unwrap_or_else(|| dir.join(name(1)))
}

pub fn sanitize_filename(input: &str) -> String {
    // Replace characters that are problematic in filenames
    let mut sanitized = input
        .replace(
            &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'][..],
            "_",
        )
        .replace("__", "_");

    sanitized = sanitized.trim().trim_matches('.').to_string();
    sanitized
}
