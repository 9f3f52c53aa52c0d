//! Serialized JSONL output.

use crate::{BatchError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes one JSON line per record. A record is serialized completely
/// before any of its bytes reach the underlying writer.
pub struct RecordWriter<W: Write> {
    inner: BufWriter<W>,
    written: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
            written: 0,
        }
    }

    pub fn write<R: Serialize>(&mut self, record: &R) -> Result<()> {
        let mut line = serde_json::to_string(record).map_err(fieldscore_core::Error::from)?;
        line.push('\n');
        self.inner
            .write_all(line.as_bytes())
            .map_err(BatchError::Output)?;
        self.written += 1;
        Ok(())
    }

    #[inline]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| BatchError::Output(e.into_error()))
    }
}

/// Output destination: stdout, a plain file, or a gzip file when the path
/// ends in `.gz`.
pub enum Sink {
    Stdout(io::Stdout),
    File(File),
    Gzip(GzEncoder<File>),
}

impl Sink {
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Sink::Stdout(io::stdout()));
        };
        let file = File::create(path).map_err(BatchError::Output)?;
        if path.extension().is_some_and(|ext| ext == "gz") {
            Ok(Sink::Gzip(GzEncoder::new(file, Compression::default())))
        } else {
            Ok(Sink::File(file))
        }
    }

    /// Flush everything, writing the gzip trailer where there is one.
    pub fn finish(self) -> Result<()> {
        match self {
            Sink::Stdout(mut out) => out.flush(),
            Sink::File(file) => file.sync_all(),
            Sink::Gzip(encoder) => encoder.finish().and_then(|file| file.sync_all()),
        }
        .map_err(BatchError::Output)
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stdout(out) => out.write(buf),
            Sink::File(file) => file.write(buf),
            Sink::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout(out) => out.flush(),
            Sink::File(file) => file.flush(),
            Sink::Gzip(encoder) => encoder.flush(),
        }
    }
}
