//! Ingest throughput over a synthetic corpus.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tempfile::TempDir;
use wikidex::config::{IndexerConfig, StoreConfig};
use wikidex::index::tokenizer::WhitespaceTokenizer;
use wikidex::{Document, Indexer, Store};

const VOCAB: &[&str] = &[
    "fox", "owl", "river", "mountain", "quiet", "forest", "ancient", "copper", "signal", "harbor",
    "lantern", "orbit", "granite", "whisper", "meadow", "ember", "glacier", "compass", "willow", "ridge",
];

fn synthetic_text(rng: &mut StdRng, words: usize) -> String {
    (0..words).map(|_| VOCAB[rng.gen_range(0..VOCAB.len())]).collect::<Vec<_>>().join(" ")
}

fn bench_add_doc(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexer_add_doc");

    for doc_count in [100usize, 1_000] {
        group.throughput(Throughput::Elements(doc_count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(doc_count), &doc_count, |b, &doc_count| {
            b.iter(|| {
                let dir = TempDir::new().unwrap();
                let store = Arc::new(Store::open(dir.path().join("bench.db"), StoreConfig::default()).unwrap());
                let mut indexer =
                    Indexer::new(store, Arc::new(WhitespaceTokenizer::default()), IndexerConfig::default());
                let mut rng = StdRng::seed_from_u64(42);

                for _ in 0..doc_count {
                    let mut doc = Document::new("bench").with_field("Text", synthetic_text(&mut rng, 200));
                    indexer.add_doc(&mut doc).unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_add_doc);
criterion_main!(benches);
