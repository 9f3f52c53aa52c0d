//! Token vocabulary with document frequencies.
//!
//! The on-disk format is a frequency table: the first line holds the corpus
//! size (number of documents), every following line a tab-separated
//! `token_id token document_frequency` triple.

use crate::{Error, Result};
use ahash::AHashMap;
use std::io::BufRead;

#[derive(Debug, Clone)]
pub struct Vocabulary {
    token_to_id: AHashMap<String, u32>,
    id_to_token: AHashMap<u32, String>,
    doc_freqs: AHashMap<u32, u64>,
    idfs: AHashMap<u32, f32>,
    corpus_size: u64,
    max_id: u32,
}

impl Vocabulary {
    /// Parse a frequency table.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines().enumerate();

        let corpus_size = loop {
            match lines.next() {
                Some((n, line)) => {
                    let line = line?;
                    let header = line.trim();
                    if header.is_empty() {
                        continue;
                    }
                    break header.parse::<u64>().map_err(|e| Error::Parse {
                        line: n + 1,
                        reason: format!("expected corpus size, got {header:?}: {e}"),
                    })?;
                }
                None => return Err(Error::EmptyVocabulary),
            }
        };

        let mut entries = Vec::new();
        for (n, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push((n + 1, parse_entry(&line, n + 1)?));
        }
        Self::build(corpus_size, entries)
    }

    /// Build from `(token_id, token, document_frequency)` triples. Errors
    /// report the 1-based position of the offending entry as its line.
    pub fn from_entries<I>(corpus_size: u64, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, String, u64)>,
    {
        Self::build(
            corpus_size,
            entries.into_iter().enumerate().map(|(n, entry)| (n + 1, entry)),
        )
    }

    /// Entries are paired with the line they came from.
    fn build<I>(corpus_size: u64, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, (u32, String, u64))>,
    {
        let mut vocab = Self {
            token_to_id: AHashMap::new(),
            id_to_token: AHashMap::new(),
            doc_freqs: AHashMap::new(),
            idfs: AHashMap::new(),
            corpus_size,
            max_id: 0,
        };

        for (line, (id, token, freq)) in entries {
            if freq == 0 {
                return Err(Error::Parse {
                    line,
                    reason: format!("token {token:?} has zero document frequency"),
                });
            }
            let idf = (corpus_size as f64 / freq as f64).log2() as f32;
            vocab.max_id = vocab.max_id.max(id);
            vocab.token_to_id.insert(token.clone(), id);
            vocab.id_to_token.insert(id, token);
            vocab.doc_freqs.insert(id, freq);
            vocab.idfs.insert(id, idf);
        }

        if vocab.token_to_id.is_empty() {
            return Err(Error::EmptyVocabulary);
        }
        Ok(vocab)
    }

    #[inline]
    pub fn lookup(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    #[inline]
    pub fn idf(&self, id: u32) -> Option<f32> {
        self.idfs.get(&id).copied()
    }

    pub fn document_frequency(&self, id: u32) -> Option<u64> {
        self.doc_freqs.get(&id).copied()
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(&id).map(String::as_str)
    }

    pub fn corpus_size(&self) -> u64 {
        self.corpus_size
    }

    pub fn len(&self) -> usize {
        self.token_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }

    /// Width of the sparse space: largest token id plus one.
    pub fn dimension(&self) -> usize {
        self.max_id as usize + 1
    }

    /// Count in-vocabulary tokens. Out-of-vocabulary tokens are dropped.
    /// The result is sorted by token id.
    pub fn bag_of_words<'a, I>(&self, tokens: I) -> Vec<(u32, u32)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: AHashMap<u32, u32> = AHashMap::new();
        for token in tokens {
            if let Some(id) = self.lookup(token) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        let mut bow: Vec<(u32, u32)> = counts.into_iter().collect();
        bow.sort_unstable_by_key(|(id, _)| *id);
        bow
    }
}

fn parse_entry(line: &str, line_no: usize) -> Result<(u32, String, u64)> {
    let malformed = |reason: String| Error::Parse {
        line: line_no,
        reason,
    };
    let mut parts = line.split('\t');
    let (Some(id), Some(token), Some(freq)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed(format!("expected 3 tab-separated columns in {line:?}")));
    };
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|e| malformed(format!("bad token id {id:?}: {e}")))?;
    let freq = freq
        .trim()
        .parse::<u64>()
        .map_err(|e| malformed(format!("bad frequency {freq:?}: {e}")))?;
    Ok((id, token.to_string(), freq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TABLE: &str = "8\n0\tneural\t2\n1\tnetwork\t4\n7\tgenome\t8\n";

    #[test]
    fn test_load_and_idf() {
        let vocab = Vocabulary::from_reader(Cursor::new(TABLE)).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.corpus_size(), 8);
        assert_eq!(vocab.lookup("network"), Some(1));
        assert_eq!(vocab.lookup("unknown"), None);
        assert!((vocab.idf(0).unwrap() - 2.0).abs() < 1e-6);
        assert!((vocab.idf(1).unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(vocab.idf(7), Some(0.0));
        assert_eq!(vocab.document_frequency(7), Some(8));
        assert_eq!(vocab.token(7), Some("genome"));
        assert_eq!(vocab.dimension(), 8);
    }

    #[test]
    fn test_empty_vocabulary() {
        assert!(matches!(
            Vocabulary::from_reader(Cursor::new("10\n")),
            Err(Error::EmptyVocabulary)
        ));
        assert!(matches!(
            Vocabulary::from_reader(Cursor::new("")),
            Err(Error::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = Vocabulary::from_reader(Cursor::new("10\n0\tok\t1\n1\tbroken\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }), "{err}");
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let err = Vocabulary::from_reader(Cursor::new("10\n0\tnever\t0\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_zero_frequency_line_counts_blank_lines() {
        let table = "\n10\n0\tok\t1\n\n\n1\tnever\t0\n";
        let err = Vocabulary::from_reader(Cursor::new(table)).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 6, .. }), "{err}");

        let err = Vocabulary::from_entries(10, [(0, "ok".to_string(), 1), (1, "never".to_string(), 0)])
            .unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_bag_of_words_counts_and_drops_oov() {
        let vocab = Vocabulary::from_reader(Cursor::new(TABLE)).unwrap();
        let bow = vocab.bag_of_words("genome neural network neural of the".split_whitespace());
        assert_eq!(bow, vec![(0, 2), (1, 1), (7, 1)]);
        assert!(vocab.bag_of_words(std::iter::empty()).is_empty());
    }
}
