//! Line-oriented readers for plain and gzip-compressed files.

use fieldscore_core::{Error, Result};
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Buffered reader over `path`, decompressing when it ends in `.gz`.
pub fn open(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read every non-blank line of a JSONL asset. Any unreadable or invalid
/// line fails the whole asset.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path, asset: &'static str) -> Result<Vec<T>> {
    let reader = open(path).map_err(|e| Error::asset(asset, path, e))?;
    let mut rows = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::asset(asset, path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line)
            .map_err(|e| Error::asset(asset, path, format!("line {}: {e}", n + 1)))?;
        rows.push(row);
    }
    Ok(rows)
}
