//! Load every asset a scoring run needs.
//!
//! Loading is all-or-nothing: the first missing, corrupt or misaligned file
//! fails with [`Error::AssetLoad`] naming the asset and its path, before any
//! document is read.

use crate::jsonl::{open, read_jsonl};
use crate::{AssetPaths, WordVectorEncoder};
use fieldscore_core::{
    DenseMatrix, Edge, EntityEntry, EntityMatcher, Error, FieldCatalog, FieldRecord, FieldVectors,
    Result, SparseMatrix, SparseVector, Vector, Vocabulary,
};
use fieldscore_similarity::{Assets, DenseEncoder, TfidfWeighting};
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// One line of the entity dictionary.
#[derive(Debug, Deserialize)]
struct EntityLine {
    surface: String,
    #[serde(default)]
    entity: Option<String>,
    vector: Vec<f32>,
}

pub fn load_vocabulary(path: &Path) -> Result<Vocabulary> {
    let reader = open(path).map_err(|e| Error::asset("vocabulary", path, e))?;
    let vocabulary = Vocabulary::from_reader(reader).map_err(|e| Error::asset("vocabulary", path, e))?;
    debug!(
        tokens = vocabulary.len(),
        corpus_size = vocabulary.corpus_size(),
        "Loaded vocabulary"
    );
    Ok(vocabulary)
}

pub fn load_word_vectors(path: &Path) -> Result<WordVectorEncoder> {
    let reader = open(path).map_err(|e| Error::asset("word vectors", path, e))?;
    let encoder =
        WordVectorEncoder::from_reader(reader).map_err(|e| Error::asset("word vectors", path, e))?;
    debug!(words = encoder.len(), "Loaded word vectors");
    Ok(encoder)
}

pub fn load_entities(path: &Path, dim: usize) -> Result<EntityMatcher> {
    let lines: Vec<EntityLine> = read_jsonl(path, "entities")?;
    let entries = lines.into_iter().map(|line| {
        let entry = EntityEntry::new(line.surface, Vector::new(line.vector));
        match line.entity {
            Some(entity) => entry.with_entity(entity),
            None => entry,
        }
    });
    let matcher = EntityMatcher::build(entries, dim).map_err(|e| Error::asset("entities", path, e))?;
    debug!(entries = matcher.len(), "Loaded entities");
    Ok(matcher)
}

fn load_dense_matrix(path: &Path, asset: &'static str) -> Result<DenseMatrix> {
    let rows: Vec<Vec<f32>> = read_jsonl(path, asset)?;
    let cols = rows.first().map(Vec::len).unwrap_or(0);
    DenseMatrix::from_rows(rows, cols).map_err(|e| Error::asset(asset, path, e))
}

fn load_sparse_matrix(path: &Path, asset: &'static str) -> Result<SparseMatrix> {
    let rows: Vec<Vec<(u32, f32)>> = read_jsonl(path, asset)?;
    Ok(SparseMatrix::from_rows(rows.into_iter().map(SparseVector::new)))
}

/// Catalog rows, hierarchy edges and the three field-vector matrices.
pub fn load_catalog(paths: &AssetPaths) -> Result<FieldCatalog> {
    let meta = paths.field_meta();
    let records: Vec<FieldRecord> = read_jsonl(&meta, "field catalog")?;
    let edges: Vec<Edge> = read_jsonl(&paths.field_children(), "field hierarchy")?;
    let vectors = FieldVectors::new(
        load_dense_matrix(&paths.field_dense_vectors(), "dense field vectors")?,
        load_sparse_matrix(&paths.field_sparse_vectors(), "sparse field vectors")?,
        load_dense_matrix(&paths.field_entity_vectors(), "entity field vectors")?,
    );
    let catalog =
        FieldCatalog::new(records, edges, vectors).map_err(|e| Error::asset("field catalog", &meta, e))?;
    debug!(fields = catalog.len(), "Loaded field catalog");
    Ok(catalog)
}

/// Load and cross-check the whole assets directory.
pub fn load_assets(paths: &AssetPaths) -> Result<Assets> {
    let started = Instant::now();
    let root = paths.root();
    if !root.is_dir() {
        return Err(Error::asset("assets", root, "Assets directory not found"));
    }

    let vocabulary = load_vocabulary(&paths.vocabulary())?;
    let catalog = load_catalog(paths)?;
    let vectors = catalog.vectors();

    let sparse_width = vectors.sparse.min_dimension();
    if sparse_width > vocabulary.dimension() {
        return Err(Error::asset(
            "sparse field vectors",
            paths.field_sparse_vectors(),
            format!(
                "token id {} is outside the vocabulary (largest id {})",
                sparse_width - 1,
                vocabulary.dimension() - 1
            ),
        ));
    }

    let entities = load_entities(&paths.entities(), vectors.entity.cols())?;

    let word_vectors = paths.word_vectors();
    let encoder = load_word_vectors(&word_vectors)?;
    if encoder.dimension() != vectors.dense.cols() {
        return Err(Error::asset(
            "word vectors",
            &word_vectors,
            Error::InvalidDimension {
                expected: vectors.dense.cols(),
                actual: encoder.dimension(),
            },
        ));
    }

    let assets = Assets::new(
        vocabulary,
        entities,
        catalog,
        Box::new(encoder),
        Box::new(TfidfWeighting),
    )
    .map_err(|e| Error::asset("assets", root, e))?;

    info!(
        root = %root.display(),
        lang = paths.lang(),
        tokens = assets.vocabulary.len(),
        entities = assets.entities.len(),
        fields = assets.catalog.len(),
        constraint_keys = assets.constraints.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Assets loaded"
    );
    Ok(assets)
}
