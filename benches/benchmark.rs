// Scoring hot-path benchmarks over a synthetic taxonomy
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fieldscore_core::{
    DenseMatrix, Edge, EntityEntry, EntityMatcher, FieldCatalog, FieldRecord, FieldVectors,
    SparseMatrix, SparseVector, Vector, Vocabulary,
};
use fieldscore_similarity::{
    rank_top_k, Assets, DenseEncoder, Document, Embedder, EngineConfig, ScoreMatrix, ScoringEngine,
    ScoringMode, TfidfWeighting,
};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashMap;

const DIM: usize = 64;
const VOCAB: usize = 2_000;
// fields per level, L0 to L3
const LEVELS: [usize; 4] = [20, 250, 2_000, 1_000];

struct RandomEncoder {
    words: HashMap<String, Vec<f32>>,
}

impl DenseEncoder for RandomEncoder {
    fn dimension(&self) -> usize {
        DIM
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut sum = vec![0.0f32; DIM];
        let mut n = 0;
        for word in text.split_whitespace() {
            if let Some(v) = self.words.get(word) {
                sum.iter_mut().zip(v).for_each(|(s, x)| *s += x);
                n += 1;
            }
        }
        if n == 0 {
            return Vec::new();
        }
        sum.into_iter().map(|x| x / n as f32).collect()
    }
}

fn random_vector(rng: &mut StdRng) -> Vec<f32> {
    (0..DIM).map(|_| rng.random_range(-1.0f32..1.0f32)).collect()
}

fn word(id: usize) -> String {
    format!("w{id}")
}

fn generate_assets(rng: &mut StdRng) -> Assets {
    let vocabulary = Vocabulary::from_entries(
        1_000_000,
        (0..VOCAB).map(|id| (id as u32, word(id), 1 + (id as u64 * 37) % 5_000)),
    )
    .unwrap();

    let words = (0..VOCAB).map(|id| (word(id), random_vector(rng))).collect();

    let entities = EntityMatcher::build(
        (0..500).map(|i| {
            let surface = format!("{} {}", word(i * 3 % VOCAB), word(i * 7 % VOCAB));
            EntityEntry::new(surface, Vector::new(random_vector(rng)))
        }),
        DIM,
    )
    .unwrap();

    let mut records = Vec::new();
    for (level, count) in LEVELS.iter().enumerate() {
        for i in 0..*count {
            records.push(FieldRecord::new(format!("l{level} field {i:05}"), level as u8));
        }
    }
    let n = records.len();

    let mut edges = Vec::new();
    for i in 0..LEVELS[1] {
        edges.push(Edge::new(format!("l0 field {:05}", i % LEVELS[0]), format!("l1 field {i:05}")));
    }
    for level in 2..4 {
        for i in 0..LEVELS[level] {
            edges.push(Edge::new(
                format!("l1 field {:05}", i % LEVELS[1]),
                format!("l{level} field {i:05}"),
            ));
        }
    }

    let dense = DenseMatrix::from_rows((0..n).map(|_| random_vector(rng)), DIM).unwrap();
    let entity = DenseMatrix::from_rows((0..n).map(|_| random_vector(rng)), DIM).unwrap();
    let sparse = SparseMatrix::from_rows((0..n).map(|_| {
        SparseVector::new(
            (0..30)
                .map(|_| (rng.random_range(0..VOCAB as u32), rng.random_range(0.0f32..1.0)))
                .collect(),
        )
    }));
    let catalog = FieldCatalog::new(records, edges, FieldVectors::new(dense, sparse, entity)).unwrap();

    Assets::new(
        vocabulary,
        entities,
        catalog,
        Box::new(RandomEncoder { words }),
        Box::new(TfidfWeighting),
    )
    .unwrap()
}

fn generate_documents(rng: &mut StdRng, count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let text: Vec<String> = (0..40).map(|_| word(rng.random_range(0..VOCAB))).collect();
            Document::new(format!("doc:{i}"), text.join(" "))
        })
        .collect()
}

fn benchmark_embed(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let assets = generate_assets(&mut rng);
    let docs = generate_documents(&mut rng, 1_000);
    let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
    let embedder = Embedder::new(&assets);

    let mut group = c.benchmark_group("embed");
    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("embed_batch", |b| {
        b.iter(|| black_box(embedder.embed_batch(black_box(&texts))));
    });
    group.bench_function("entity_mentions", |b| {
        b.iter(|| {
            for text in &texts {
                black_box(assets.entities.embed(text));
            }
        });
    });
    group.finish();
}

fn benchmark_rank(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let rows: Vec<Vec<f32>> = (0..1_000)
        .map(|_| (0..2_000).map(|_| rng.random_range(0.0f32..1.0)).collect())
        .collect();
    let scores = ScoreMatrix::from_dense(&DenseMatrix::from_rows(rows, 2_000).unwrap());

    c.bench_function("rank_top_k_1000x2000", |b| {
        b.iter(|| black_box(rank_top_k(black_box(&scores), 10, 0)));
    });
}

fn benchmark_score(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let assets = generate_assets(&mut rng);

    let mut group = c.benchmark_group("score_batch");
    group.sample_size(10);
    for size in [100, 1_000].iter() {
        let docs = generate_documents(&mut rng, *size);
        group.throughput(Throughput::Elements(*size as u64));
        for mode in [ScoringMode::Constrained, ScoringMode::Exhaustive] {
            let config = EngineConfig {
                mode,
                ..EngineConfig::default()
            };
            let engine = ScoringEngine::new(&assets, config).unwrap();
            group.bench_with_input(BenchmarkId::new(format!("{mode:?}"), size), &docs, |b, docs| {
                b.iter(|| black_box(engine.score_batch(black_box(docs)).unwrap()));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, benchmark_embed, benchmark_rank, benchmark_score);
criterion_main!(benches);
