//! Read-only assets shared by every worker for the length of a run.

use crate::{DenseEncoder, LexicalWeighting};
use fieldscore_core::{ConstraintIndex, EntityMatcher, Error, FieldCatalog, Result, Vocabulary};
use std::fmt;

pub struct Assets {
    pub vocabulary: Vocabulary,
    pub entities: EntityMatcher,
    pub catalog: FieldCatalog,
    pub constraints: ConstraintIndex,
    pub dense_encoder: Box<dyn DenseEncoder>,
    pub weighting: Box<dyn LexicalWeighting>,
}

impl Assets {
    /// Bundle loaded assets and derive the constraint index from the
    /// catalog hierarchy. The encoder and the entity dictionary must match
    /// the dimensions of the corresponding field vectors.
    pub fn new(
        vocabulary: Vocabulary,
        entities: EntityMatcher,
        catalog: FieldCatalog,
        dense_encoder: Box<dyn DenseEncoder>,
        weighting: Box<dyn LexicalWeighting>,
    ) -> Result<Self> {
        let vectors = catalog.vectors();
        if dense_encoder.dimension() != vectors.dense.cols() {
            return Err(Error::InvalidDimension {
                expected: vectors.dense.cols(),
                actual: dense_encoder.dimension(),
            });
        }
        if entities.dim() != vectors.entity.cols() {
            return Err(Error::InvalidDimension {
                expected: vectors.entity.cols(),
                actual: entities.dim(),
            });
        }
        let constraints = ConstraintIndex::from_catalog(&catalog);
        Ok(Self {
            vocabulary,
            entities,
            catalog,
            constraints,
            dense_encoder,
            weighting,
        })
    }
}

impl fmt::Debug for Assets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assets")
            .field("vocabulary", &self.vocabulary.len())
            .field("entities", &self.entities.len())
            .field("fields", &self.catalog.len())
            .field("constraints", &self.constraints.len())
            .field("dense_dimension", &self.dense_encoder.dimension())
            .finish()
    }
}
