//! Dense sentence encoder backed by pretrained word vectors.
//!
//! Reads the fastText `.vec` text format: an optional `count dimension`
//! header, then one `word v1 v2 ... vD` line per word. A sentence vector is
//! the mean of the unit-length vectors of its known words.

use ahash::AHashMap;
use fieldscore_core::{Error, Result, Vector};
use fieldscore_similarity::DenseEncoder;
use std::io::BufRead;

#[derive(Debug, Clone)]
pub struct WordVectorEncoder {
    dim: usize,
    words: AHashMap<String, Vector>,
}

impl WordVectorEncoder {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut dim = 0;
        let mut words = AHashMap::new();

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };
            let values: Vec<&str> = parts.collect();

            // "count dimension" header
            if n == 0 && values.len() == 1 && word.parse::<u64>().is_ok() {
                dim = values[0].parse::<usize>().map_err(|e| Error::Parse {
                    line: 1,
                    reason: format!("bad dimension {:?}: {e}", values[0]),
                })?;
                continue;
            }

            let vector = values
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| Error::Parse {
                    line: n + 1,
                    reason: format!("bad component for {word:?}: {e}"),
                })?;
            if dim == 0 {
                dim = vector.len();
            }
            if vector.len() != dim {
                return Err(Error::Parse {
                    line: n + 1,
                    reason: format!("{word:?} has {} components, expected {dim}", vector.len()),
                });
            }
            words.insert(word.to_string(), Vector::new(vector).normalized());
        }

        Ok(Self { dim, words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }
}

impl DenseEncoder for WordVectorEncoder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut sum = Vector::zeros(self.dim);
        let mut known = 0usize;
        for word in text.split_whitespace() {
            if let Some(v) = self.words.get(word) {
                sum += v;
                known += 1;
            }
        }
        if known == 0 {
            return Vec::new();
        }
        let scale = 1.0 / known as f32;
        sum.into_inner().into_iter().map(|x| x * scale).collect()
    }
}
