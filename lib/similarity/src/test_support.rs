//! In-memory fixture shared by the unit tests.
//!
//! Four-dimensional vectors over the axes `[computing, biology, language,
//! sequencing]`; two L0, two L1, three L2 and two L3 fields.

use crate::{Assets, DenseEncoder, Document, TfidfWeighting};
use fieldscore_core::{
    DenseMatrix, Edge, EntityEntry, EntityMatcher, FieldCatalog, FieldRecord, FieldVectors,
    SparseMatrix, SparseVector, Vector, Vocabulary,
};
use std::collections::HashMap;

/// Average of unit-length word vectors; empty when no word is known.
pub struct TableEncoder {
    words: HashMap<&'static str, [f32; 4]>,
}

impl DenseEncoder for TableEncoder {
    fn dimension(&self) -> usize {
        4
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut sum = Vector::zeros(4);
        let mut n = 0;
        for word in text.split_whitespace() {
            if let Some(v) = self.words.get(word) {
                sum += &Vector::new(v.to_vec()).normalized();
                n += 1;
            }
        }
        if n == 0 {
            return Vec::new();
        }
        sum.into_inner().into_iter().map(|x| x / n as f32).collect()
    }
}

pub const TOKENS: [(&str, u64); 13] = [
    ("natural", 4),
    ("language", 4),
    ("processing", 4),
    ("machine", 4),
    ("learning", 4),
    ("gene", 4),
    ("expression", 4),
    ("dna", 4),
    ("sequencing", 4),
    ("parsing", 4),
    ("neural", 4),
    ("network", 8),
    ("the", 16),
];

fn encoder() -> TableEncoder {
    let words = HashMap::from([
        ("natural", [0.0, 0.0, 1.0, 0.0]),
        ("language", [0.0, 0.0, 1.0, 0.0]),
        ("processing", [1.0, 0.0, 1.0, 0.0]),
        ("machine", [1.0, 0.0, 0.0, 0.0]),
        ("learning", [1.0, 0.0, 0.0, 0.0]),
        ("neural", [1.0, 0.0, 0.0, 0.0]),
        ("network", [1.0, 0.0, 0.0, 0.0]),
        ("gene", [0.0, 1.0, 0.0, 0.0]),
        ("expression", [0.0, 1.0, 0.0, 0.0]),
        ("dna", [0.0, 1.0, 0.0, 1.0]),
        ("sequencing", [0.0, 1.0, 0.0, 1.0]),
        ("parsing", [1.0, 0.0, 1.0, 0.0]),
    ]);
    TableEncoder { words }
}

/// `(name, level, dense, sparse tokens, entity)`, in catalog order.
type FieldRow = (&'static str, u8, [f32; 4], &'static [&'static str], [f32; 4]);

const FIELDS: [FieldRow; 9] = [
    ("Biology", 0, [0.0, 1.0, 0.0, 0.2], &["gene", "expression", "dna", "sequencing"], [0.0, 1.0, 0.0, 0.5]),
    (
        "Computer science",
        0,
        [1.0, 0.0, 0.5, 0.0],
        &["machine", "learning", "neural", "network", "processing", "parsing"],
        [1.0, 0.0, 0.5, 0.0],
    ),
    (
        "Artificial intelligence",
        1,
        [1.0, 0.0, 0.3, 0.0],
        &["machine", "learning", "neural", "natural", "language"],
        [1.0, 0.0, 0.6, 0.0],
    ),
    ("Genetics", 1, [0.0, 1.0, 0.0, 0.5], &["gene", "expression", "dna"], [0.0, 1.0, 0.0, 0.3]),
    ("Gene expression", 2, [0.0, 1.0, 0.0, 0.0], &["gene", "expression"], [0.0, 1.0, 0.0, 0.0]),
    ("Machine learning", 2, [1.0, 0.0, 0.0, 0.0], &["machine", "learning"], [1.0, 0.0, 0.0, 0.0]),
    (
        "Natural language processing",
        2,
        [0.5, 0.0, 1.0, 0.0],
        &["natural", "language", "processing"],
        [1.0, 0.0, 1.0, 0.0],
    ),
    ("Parsing", 3, [0.5, 0.0, 1.0, 0.0], &["parsing"], [0.5, 0.0, 1.0, 0.0]),
    ("Sequencing", 3, [0.0, 0.5, 0.0, 1.0], &["dna", "sequencing"], [0.0, 1.0, 0.0, 1.0]),
];

const EDGES: [(&str, &str); 7] = [
    ("Computer science", "Artificial intelligence"),
    ("Biology", "Genetics"),
    ("Artificial intelligence", "Machine learning"),
    ("Artificial intelligence", "Natural language processing"),
    ("Artificial intelligence", "Parsing"),
    ("Genetics", "Gene expression"),
    ("Genetics", "Sequencing"),
];

const ENTITIES: [(&str, [f32; 4]); 5] = [
    ("natural language processing", [1.0, 0.0, 1.0, 0.0]),
    ("natural language", [0.0, 0.0, 1.0, 0.0]),
    ("machine learning", [1.0, 0.0, 0.0, 0.0]),
    ("gene expression", [0.0, 1.0, 0.0, 0.0]),
    ("dna sequencing", [0.0, 1.0, 0.0, 1.0]),
];

pub fn fixture_assets() -> Assets {
    let vocabulary = Vocabulary::from_entries(
        16,
        TOKENS
            .iter()
            .enumerate()
            .map(|(id, (token, freq))| (id as u32, token.to_string(), *freq)),
    )
    .unwrap();

    let entities = EntityMatcher::build(
        ENTITIES
            .iter()
            .map(|(surface, v)| EntityEntry::new(*surface, Vector::new(v.to_vec()))),
        4,
    )
    .unwrap();

    let records = FIELDS.iter().map(|f| FieldRecord::new(f.0, f.1)).collect();
    let dense = DenseMatrix::from_rows(FIELDS.iter().map(|f| f.2), 4).unwrap();
    let entity = DenseMatrix::from_rows(FIELDS.iter().map(|f| f.4), 4).unwrap();
    let sparse = SparseMatrix::from_rows(FIELDS.iter().map(|f| {
        SparseVector::new(
            f.3.iter()
                .map(|t| (vocabulary.lookup(t).unwrap(), 1.0))
                .collect(),
        )
    }));
    let edges = EDGES.iter().map(|(p, c)| Edge::new(*p, *c));
    let catalog =
        FieldCatalog::new(records, edges, FieldVectors::new(dense, sparse, entity)).unwrap();

    Assets::new(
        vocabulary,
        entities,
        catalog,
        Box::new(encoder()),
        Box::new(TfidfWeighting),
    )
    .unwrap()
}

pub fn fixture_records() -> Vec<Document> {
    vec![
        Document::new("carl:1", "natural language processing"),
        Document::new("carl:2", "machine learning for dna sequencing"),
        Document::new("carl:3", "gene expression of the neural network"),
        Document::new("carl:4", ""),
        Document::new("carl:5", "parsing natural language with machine learning"),
    ]
}
