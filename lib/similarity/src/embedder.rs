//! Document embedding.
//!
//! Each document gets three independent representations: a dense sentence
//! vector from an injected [`DenseEncoder`], a sparse lexical vector from
//! vocabulary counts passed through an injected [`LexicalWeighting`], and an
//! entity vector from the [`EntityMatcher`](fieldscore_core::EntityMatcher).
//! Text is expected to be lowercased already; nothing here folds case.

use crate::Assets;
use fieldscore_core::{SparseVector, Vector, Vocabulary};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Pretrained sentence encoder, used for inference only.
pub trait DenseEncoder: Send + Sync {
    /// Output dimension.
    fn dimension(&self) -> usize;

    /// Encode `text`. An empty vector means there was nothing to encode.
    fn encode(&self, text: &str) -> Vec<f32>;
}

/// Pretrained lexical weighting applied to a bag of words.
pub trait LexicalWeighting: Send + Sync {
    /// Turn `(token_id, count)` pairs, sorted by id, into weights.
    fn weigh(&self, vocabulary: &Vocabulary, counts: &[(u32, u32)]) -> Vec<(u32, f32)>;
}

/// `tf * idf`, scaled to unit length.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfidfWeighting;

impl LexicalWeighting for TfidfWeighting {
    fn weigh(&self, vocabulary: &Vocabulary, counts: &[(u32, u32)]) -> Vec<(u32, f32)> {
        let weights = counts
            .iter()
            .filter_map(|&(id, tf)| vocabulary.idf(id).map(|idf| (id, tf as f32 * idf)))
            .collect();
        SparseVector::new(weights).normalized().entries().to_vec()
    }
}

/// The three representations of one document. Undefined signals
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    #[serde(default)]
    pub dense: Option<Vector>,
    #[serde(default)]
    pub sparse: Option<SparseVector>,
    pub entity: Vector,
}

impl Embedding {
    /// No dense or sparse signal and no entity mention.
    pub fn is_blank(&self) -> bool {
        self.dense.is_none() && self.sparse.is_none() && self.entity.is_zero()
    }
}

/// Embeddings of a chunk, one column per signal.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedBatch {
    pub dense: Vec<Option<Vector>>,
    pub sparse: Vec<Option<SparseVector>>,
    pub entity: Vec<Vector>,
}

impl EmbeddedBatch {
    pub fn len(&self) -> usize {
        self.entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity.is_empty()
    }

    /// The embeddings of the given documents, in the given order.
    #[must_use]
    pub fn select(&self, docs: &[usize]) -> Self {
        Self {
            dense: docs.iter().map(|&i| self.dense[i].clone()).collect(),
            sparse: docs.iter().map(|&i| self.sparse[i].clone()).collect(),
            entity: docs.iter().map(|&i| self.entity[i].clone()).collect(),
        }
    }
}

impl FromIterator<Embedding> for EmbeddedBatch {
    fn from_iter<I: IntoIterator<Item = Embedding>>(iter: I) -> Self {
        let mut batch = EmbeddedBatch::default();
        for e in iter {
            batch.dense.push(e.dense);
            batch.sparse.push(e.sparse);
            batch.entity.push(e.entity);
        }
        batch
    }
}

#[derive(Clone, Copy)]
pub struct Embedder<'a> {
    assets: &'a Assets,
}

impl<'a> Embedder<'a> {
    pub fn new(assets: &'a Assets) -> Self {
        Self { assets }
    }

    /// Dense sentence vector, unit length. `None` when the encoder returns
    /// nothing or a zero vector.
    pub fn dense_embed(&self, text: &str) -> Option<Vector> {
        let encoded = Vector::new(self.assets.dense_encoder.encode(text));
        if encoded.is_empty() || encoded.is_zero() {
            return None;
        }
        Some(encoded.normalized())
    }

    /// Weighted bag of words. `None` when no token is in the vocabulary or
    /// every weight vanishes.
    pub fn sparse_embed<'t, I>(&self, tokens: I) -> Option<SparseVector>
    where
        I: IntoIterator<Item = &'t str>,
    {
        let vocabulary = &self.assets.vocabulary;
        let counts = vocabulary.bag_of_words(tokens);
        if counts.is_empty() {
            return None;
        }
        let weights = SparseVector::new(self.assets.weighting.weigh(vocabulary, &counts));
        (!weights.is_empty()).then_some(weights)
    }

    /// Normalized sum of entity-mention vectors; zero when nothing matches.
    pub fn entity_embed(&self, text: &str) -> Vector {
        self.assets.entities.embed(text)
    }

    pub fn embed(&self, text: &str) -> Embedding {
        Embedding {
            dense: self.dense_embed(text),
            sparse: self.sparse_embed(text.split_whitespace()),
            entity: self.entity_embed(text),
        }
    }

    /// Embed a chunk in parallel; output order follows input order.
    pub fn embed_all(&self, texts: &[&str]) -> Vec<Embedding> {
        texts.par_iter().map(|t| self.embed(t)).collect()
    }

    /// [`embed_all`](Self::embed_all), one column per signal.
    pub fn embed_batch(&self, texts: &[&str]) -> EmbeddedBatch {
        self.embed_all(texts).into_iter().collect()
    }
}
