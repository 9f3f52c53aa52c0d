//! Hierarchical constrained scoring.
//!
//! A batch is scored against the L0 and L1 fields first. Each document's
//! best L0 and L1 rows select the [`ConstraintKey`]s it is eligible for, and
//! documents sharing a key are scored together against only that key's
//! L2/L3 descendants. The fine scores are scattered into one matrix spanning
//! the whole catalog and ranked per level.

use crate::rank::{rank_top_k, Ranking};
use crate::record::{round_score, Document, EmbeddedDocument, ScoreRecord, ScoredField, SignalScores};
use crate::similarity::{average_similarity, dense_signal, entity_signal, sparse_signal};
use crate::{Assets, EmbeddedBatch, Embedder, EngineConfig, ScoreMatrix, ScoringMode};
use ahash::AHashSet;
use fieldscore_core::{ConstraintKey, Error, FieldVectors, Level, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Field rows scored together in the fine pass, with their vectors.
#[derive(Debug, Clone)]
struct FieldGroup {
    rows: Vec<usize>,
    vectors: FieldVectors,
}

/// Combined scores, plus the three inputs when explaining.
struct Signals {
    combined: ScoreMatrix,
    parts: Option<[ScoreMatrix; 3]>,
}

impl Signals {
    fn undefined(rows: usize, cols: usize, explain: bool) -> Self {
        Self {
            combined: ScoreMatrix::undefined(rows, cols),
            parts: explain.then(|| std::array::from_fn(|_| ScoreMatrix::undefined(rows, cols))),
        }
    }

    fn scatter(&mut self, docs: &[usize], fields: &[usize], block: &Signals) -> Result<()> {
        self.combined.scatter(docs, fields, &block.combined)?;
        if let (Some(parts), Some(block_parts)) = (self.parts.as_mut(), block.parts.as_ref()) {
            for (part, block_part) in parts.iter_mut().zip(block_parts) {
                part.scatter(docs, fields, block_part)?;
            }
        }
        Ok(())
    }

    fn signal_scores(&self, doc: usize, col: usize, precision: u32) -> Option<SignalScores> {
        let [dense, sparse, entity] = self.parts.as_ref()?;
        let round = |m: &ScoreMatrix| m.get(doc, col).map(|v| round_score(v, precision));
        Some(SignalScores {
            dense: round(dense),
            sparse: round(sparse),
            entity: round(entity),
        })
    }
}

/// Scores documents against a catalog. Field vectors for the coarse slice
/// and for every constraint group are copied out once, so a single engine
/// can be shared by all workers.
#[derive(Debug)]
pub struct ScoringEngine<'a> {
    assets: &'a Assets,
    config: EngineConfig,
    coarse: FieldVectors,
    groups: BTreeMap<ConstraintKey, FieldGroup>,
    all_fine: FieldGroup,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(assets: &'a Assets, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let catalog = &assets.catalog;
        let vectors = catalog.vectors();

        let coarse = vectors.slice(catalog.coarse_range());
        let groups = assets
            .constraints
            .iter()
            .map(|(key, rows)| {
                let group = FieldGroup {
                    rows: rows.to_vec(),
                    vectors: vectors.select(rows),
                };
                (*key, group)
            })
            .collect();
        let fine_rows: Vec<usize> = catalog.fine_range().collect();
        let all_fine = FieldGroup {
            vectors: vectors.select(&fine_rows),
            rows: fine_rows,
        };

        debug!(
            coarse_fields = coarse.rows(),
            fine_fields = all_fine.rows.len(),
            constraint_keys = assets.constraints.len(),
            mode = ?config.mode,
            "Scoring engine ready"
        );

        Ok(Self {
            assets,
            config,
            coarse,
            groups,
            all_fine,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn assets(&self) -> &Assets {
        self.assets
    }

    /// Score a chunk of documents; one record per document, in input order.
    pub fn score_batch(&self, docs: &[Document]) -> Result<Vec<ScoreRecord>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        let batch = Embedder::new(self.assets).embed_batch(&texts);
        let ids: Vec<&str> = docs.iter().map(|d| d.merged_id.as_str()).collect();
        self.score_embeddings(&ids, &batch)
    }

    /// Score documents embedded earlier by the same assets. Vectors whose
    /// dimension differs from the catalog's are an error.
    pub fn score_embedded(&self, docs: &[EmbeddedDocument]) -> Result<Vec<ScoreRecord>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let batch: EmbeddedBatch = docs.iter().map(|d| d.embedding.clone()).collect();
        let ids: Vec<&str> = docs.iter().map(|d| d.merged_id.as_str()).collect();
        self.score_embeddings(&ids, &batch)
    }

    fn score_embeddings(&self, ids: &[&str], batch: &EmbeddedBatch) -> Result<Vec<ScoreRecord>> {
        let catalog = &self.assets.catalog;

        // coarse pass
        let coarse = self.signals(batch, &self.coarse)?;
        let coarse_start = catalog.coarse_range().start;
        let rank_level = |scores: &ScoreMatrix, level: Level, start: usize| {
            let range = catalog.level_range(level);
            let local = range.start - start..range.end - start;
            rank_top_k(&scores.slice_cols(local), self.config.top_k, range.start)
        };
        let l0 = rank_level(&coarse.combined, Level::L0, coarse_start);
        let l1 = rank_level(&coarse.combined, Level::L1, coarse_start);

        // fine pass
        let mut fine = Signals::undefined(ids.len(), catalog.len(), self.config.explain);
        let members = self.eligibility(&l0, &l1, ids.len());
        for (group, doc_rows) in &members {
            let block = self.signals(&batch.select(doc_rows), &group.vectors)?;
            fine.scatter(doc_rows, &group.rows, &block)?;
        }
        let l2 = rank_level(&fine.combined, Level::L2, 0);
        let l3 = rank_level(&fine.combined, Level::L3, 0);

        debug!(
            documents = ids.len(),
            groups = members.len(),
            fine_cells = fine.combined.defined_count(),
            "Scored batch"
        );

        ids.iter()
            .enumerate()
            .map(|(i, merged_id)| {
                let levels = [
                    (&l0, &coarse, coarse_start),
                    (&l1, &coarse, coarse_start),
                    (&l2, &fine, 0),
                    (&l3, &fine, 0),
                ];
                self.emit(merged_id, i, &levels)
            })
            .collect()
    }

    /// Documents per fine group, in key order.
    fn eligibility(&self, l0: &Ranking, l1: &Ranking, n: usize) -> Vec<(&FieldGroup, Vec<usize>)> {
        if self.config.mode == ScoringMode::Exhaustive {
            if self.all_fine.rows.is_empty() {
                return Vec::new();
            }
            return vec![(&self.all_fine, (0..n).collect())];
        }

        let mut members: BTreeMap<ConstraintKey, Vec<usize>> = BTreeMap::new();
        for doc in 0..n {
            let top_l0 = l0.best(doc, self.config.coarse_k);
            let top_l1 = l1.best(doc, self.config.coarse_k);
            let (_, keys) = self.assets.constraints.eligible(top_l0, top_l1);
            for key in keys {
                members.entry(key).or_default().push(doc);
            }
        }
        members
            .into_iter()
            .filter_map(|(key, docs)| self.groups.get(&key).map(|g| (g, docs)))
            .collect()
    }

    fn signals(&self, batch: &EmbeddedBatch, fields: &FieldVectors) -> Result<Signals> {
        let dense = dense_signal(&batch.dense, &fields.dense)?;
        let sparse = sparse_signal(&batch.sparse, &fields.sparse);
        let entity = entity_signal(&batch.entity, &fields.entity)?;
        let combined = average_similarity(&[&dense, &sparse, &entity])?;
        Ok(Signals {
            combined,
            parts: self.config.explain.then_some([dense, sparse, entity]),
        })
    }

    fn emit(
        &self,
        merged_id: &str,
        row: usize,
        levels: &[(&Ranking, &Signals, usize); 4],
    ) -> Result<ScoreRecord> {
        let catalog = &self.assets.catalog;
        let precision = self.config.precision;
        let mut fields = Vec::new();

        for (ranking, signals, col_start) in levels {
            for (index, value) in ranking.best_first(row) {
                let Some(score) = value.filter(|v| *v != 0.0) else {
                    continue;
                };
                fields.push(ScoredField {
                    name: catalog.name(index).to_string(),
                    score: round_score(score, precision),
                    signals: signals.signal_scores(row, index - col_start, precision),
                });
            }
        }
        check_distinct(merged_id, &fields)?;

        Ok(ScoreRecord {
            merged_id: merged_id.to_string(),
            fields,
        })
    }
}

/// A field name may appear once per record; a repeat means the catalog or
/// the constraint index is inconsistent.
pub fn check_distinct(merged_id: &str, fields: &[ScoredField]) -> Result<()> {
    let mut seen = AHashSet::with_capacity(fields.len());
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(Error::CatalogIntegrity(format!(
                "field {:?} reported twice for document {merged_id:?}",
                field.name
            )));
        }
    }
    Ok(())
}
