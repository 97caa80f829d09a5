use std::hint::black_box;

use codec_harness::{BenchSession, CodecKind, Corpus, DEFAULT_LEVELS, HarnessConfig};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

/// Set to a file path to benchmark a real corpus instead of the generated one.
const CORPUS_ENV: &str = "CODEC_HARNESS_CORPUS";

fn make_payload(size: usize) -> Vec<u8> {
    // Semi-compressible: repeating pattern with some variation
    (0..size).map(|i| ((i % 251) ^ (i / 1024 % 7)) as u8).collect()
}

fn session() -> BenchSession {
    let config = HarnessConfig {
        verify: false,
        ..Default::default()
    };
    match std::env::var_os(CORPUS_ENV) {
        Some(path) => BenchSession::setup(HarnessConfig {
            corpus_path: path.into(),
            ..config
        })
        .unwrap_or_else(|e| panic!("{e}")),
        None => BenchSession::with_corpus(config, Corpus::from_bytes(make_payload(256 * 1024))),
    }
}

fn bench_codecs(c: &mut Criterion) {
    let session = session();
    let corpus_len = session.corpus().len() as u64;

    for kind in CodecKind::ALL {
        let mut group = c.benchmark_group(kind.name());
        group.throughput(Throughput::Bytes(corpus_len));

        for level in DEFAULT_LEVELS {
            group.bench_with_input(BenchmarkId::new("compress", level), &level, |b, &level| {
                b.iter(|| session.compress(kind, black_box(level)).unwrap());
            });

            group.bench_with_input(BenchmarkId::new("decompress", level), &level, |b, &level| {
                b.iter(|| session.decompress(kind, black_box(level)).unwrap());
            });
        }
        group.finish();
    }
}

criterion_group!(benches, bench_codecs);
criterion_main!(benches);
