//! Streaming JSONL input: `{"merged_id", "text"}` documents, or embeddings
//! saved by an earlier `embed` run.
//!
//! The input is a JSONL file, optionally gzip-compressed, or a directory of
//! such files read in name order. Lines that are not valid records are
//! logged, counted and skipped.

use crate::{BatchError, Result};
use fieldscore_core::Error as CoreError;
use fieldscore_similarity::Document;
use fieldscore_storage::jsonl;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{BufRead, Lines};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The files behind `input`: the file itself, or the `*.jsonl` and
/// `*.jsonl.gz` files of a directory, sorted by name.
pub fn input_files(input: &Path) -> Result<Vec<PathBuf>> {
    let input_error = |source| BatchError::Input {
        path: input.to_path_buf(),
        source,
    };
    let meta = fs::metadata(input).map_err(input_error)?;
    if !meta.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(input).map_err(input_error)? {
        let path = entry.map_err(input_error)?.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if path.is_file() && (name.ends_with(".jsonl") || name.ends_with(".jsonl.gz")) {
            files.push(path);
        }
    }
    files.sort();
    if files.is_empty() {
        warn!(dir = %input.display(), "Input directory has no .jsonl or .jsonl.gz files");
    }
    Ok(files)
}

struct OpenFile {
    path: PathBuf,
    lines: Lines<Box<dyn BufRead + Send>>,
    line: usize,
}

/// Reads records of type `T`, one per line, across every input file.
pub struct RecordReader<T = Document> {
    files: std::vec::IntoIter<PathBuf>,
    current: Option<OpenFile>,
    read: u64,
    malformed: u64,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> RecordReader<T> {
    pub fn open(input: &Path) -> Result<Self> {
        Ok(Self::new(input_files(input)?))
    }

    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files: files.into_iter(),
            current: None,
            read: 0,
            malformed: 0,
            _record: PhantomData,
        }
    }

    /// Valid records returned so far.
    pub fn read(&self) -> u64 {
        self.read
    }

    /// Lines skipped as malformed so far.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Up to `max` records; fewer only at the end of input.
    pub fn next_chunk(&mut self, max: usize) -> Result<Vec<T>> {
        let mut chunk = Vec::with_capacity(max.min(16_384));
        while chunk.len() < max {
            match self.next() {
                Some(doc) => chunk.push(doc?),
                None => break,
            }
        }
        Ok(chunk)
    }
}

impl<T: DeserializeOwned> Iterator for RecordReader<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                let path = self.files.next()?;
                match jsonl::open(&path) {
                    Ok(reader) => {
                        debug!(file = %path.display(), "Reading input");
                        self.current = Some(OpenFile {
                            path,
                            lines: reader.lines(),
                            line: 0,
                        });
                    }
                    Err(source) => return Some(Err(BatchError::Input { path, source })),
                }
            }

            let file = self.current.as_mut()?;
            match file.lines.next() {
                None => self.current = None,
                Some(Err(source)) => {
                    let path = file.path.clone();
                    self.current = None;
                    return Some(Err(BatchError::Input { path, source }));
                }
                Some(Ok(line)) => {
                    file.line += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<T>(&line) {
                        Ok(doc) => {
                            self.read += 1;
                            return Some(Ok(doc));
                        }
                        Err(e) => {
                            self.malformed += 1;
                            let err = CoreError::MalformedRecord {
                                line: file.line,
                                reason: e.to_string(),
                            };
                            warn!(file = %file.path.display(), error = %err, "Skipping malformed record");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldscore_similarity::EmbeddedDocument;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write_gz(path: &Path, body: &str) {
        let mut encoder = GzEncoder::new(fs::File::create(path).unwrap(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_skips_malformed_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.jsonl");
        fs::write(
            &path,
            concat!(
                "{\"merged_id\": \"a\", \"text\": \"dna\"}\n",
                "not json\n",
                "\n",
                "{\"merged_id\": \"b\"}\n",
                "{\"merged_id\": \"c\", \"text\": \"\"}\n",
            ),
        )
        .unwrap();
        let mut reader: RecordReader = RecordReader::open(&path).unwrap();
        let ids: Vec<String> = reader.by_ref().map(|d| d.unwrap().merged_id).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(reader.read(), 2);
        assert_eq!(reader.malformed(), 2);
    }

    #[test]
    fn test_directory_in_name_order_with_gzip() {
        let dir = tempfile::tempdir().unwrap();
        write_gz(&dir.path().join("part-1.jsonl.gz"), "{\"merged_id\": \"2\", \"text\": \"x\"}\n");
        fs::write(dir.path().join("part-0.jsonl"), "{\"merged_id\": \"1\", \"text\": \"x\"}\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = input_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        let ids: Vec<String> = RecordReader::<Document>::new(files)
            .map(|d| d.unwrap().merged_id)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_next_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.jsonl");
        let body: String = (0..5)
            .map(|i| format!("{{\"merged_id\": \"{i}\", \"text\": \"t\"}}\n"))
            .collect();
        fs::write(&path, body).unwrap();
        let mut reader: RecordReader = RecordReader::open(&path).unwrap();
        assert_eq!(reader.next_chunk(2).unwrap().len(), 2);
        assert_eq!(reader.next_chunk(2).unwrap().len(), 2);
        assert_eq!(reader.next_chunk(2).unwrap().len(), 1);
        assert!(reader.next_chunk(2).unwrap().is_empty());
    }

    #[test]
    fn test_reads_saved_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.jsonl");
        fs::write(
            &path,
            concat!(
                "{\"merged_id\": \"a\", \"dense\": [0.6, 0.8], \"sparse\": [[2, 1.0]], \"entity\": [0.0, 0.0]}\n",
                "{\"merged_id\": \"b\", \"text\": \"not an embedding\"}\n",
                "{\"merged_id\": \"c\", \"dense\": null, \"sparse\": null, \"entity\": [1.0, 0.0]}\n",
            ),
        )
        .unwrap();
        let mut reader = RecordReader::<EmbeddedDocument>::open(&path).unwrap();
        let docs = reader.next_chunk(10).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].merged_id, "a");
        assert!(docs[0].embedding.dense.is_some());
        assert!(docs[1].embedding.sparse.is_none());
        assert_eq!(reader.malformed(), 1);
    }

    #[test]
    fn test_missing_input() {
        let err = RecordReader::<Document>::open(Path::new("/nonexistent/input.jsonl"))
            .err()
            .unwrap();
        assert!(matches!(err, BatchError::Input { .. }));
    }
}
