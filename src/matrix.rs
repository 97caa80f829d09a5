use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::cache::{CellKey, PrecomputedCache};
use crate::codec::{self, CodecAdapter, adapter_for};
use crate::config::{CodecKind, Direction, HarnessConfig};
use crate::corpus::Corpus;
use crate::error::{CodecError, Error, Result};
use crate::report::{CellOutcome, MatrixReport, VerificationOutcome, VerificationStatus};
use crate::verify::{self, VerificationResult};

/// One benchmark session: a corpus, the configured adapters and, when
/// decompression is measured, the precomputed artifacts.
///
/// Cells share nothing mutable, so every operation takes `&self` and may be
/// called from several threads at once. Dropping the session discards the cache.
pub struct BenchSession {
    config: HarnessConfig,
    corpus: Corpus,
    adapters: Vec<Arc<dyn CodecAdapter>>,
    levels: Vec<u32>,
    cache: PrecomputedCache,
    /// Decompression cells whose artifact could not be produced at setup.
    setup_failures: Vec<CodecError>,
}

impl BenchSession {
    /// Load the configured corpus and prepare every cell.
    ///
    /// A corpus that cannot be read aborts the session before any cell runs.
    pub fn setup(config: HarnessConfig) -> Result<Self> {
        let corpus = Corpus::load(&config.corpus_path)?;
        Ok(Self::with_corpus(config, corpus))
    }

    /// Prepare a session over an in-memory corpus.
    pub fn with_corpus(config: HarnessConfig, corpus: Corpus) -> Self {
        let kinds: BTreeSet<CodecKind> = config.codecs.iter().copied().collect();
        let adapters = kinds
            .into_iter()
            .map(|kind| adapter_for(kind, &config.options))
            .collect();
        Self::with_adapters(config, corpus, adapters)
    }

    /// Prepare a session that drives caller-supplied adapters instead of the
    /// ones `config.codecs` names. Cells are keyed by [`CodecAdapter::kind`];
    /// when two adapters report the same kind the first one is kept.
    pub fn with_adapters(config: HarnessConfig, corpus: Corpus, adapters: Vec<Arc<dyn CodecAdapter>>) -> Self {
        let mut seen = BTreeSet::new();
        let adapters: Vec<Arc<dyn CodecAdapter>> =
            adapters.into_iter().filter(|a| seen.insert(a.kind())).collect();
        let levels: Vec<u32> = config.levels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

        let (cache, setup_failures) = if config.measure_decompression {
            PrecomputedCache::populate(&adapters, &levels, corpus.as_bytes(), config.parallel)
        } else {
            (PrecomputedCache::default(), Vec::new())
        };

        tracing::info!(
            corpus_bytes = corpus.len(),
            codecs = adapters.len(),
            levels = levels.len(),
            cached = cache.len(),
            "bench session ready"
        );

        Self {
            config,
            corpus,
            adapters,
            levels,
            cache,
            setup_failures,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn cache(&self) -> &PrecomputedCache {
        &self.cache
    }

    /// Distinct levels, ascending.
    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn codecs(&self) -> impl Iterator<Item = CodecKind> + '_ {
        self.adapters.iter().map(|a| a.kind())
    }

    fn adapter(&self, kind: CodecKind) -> Result<&dyn CodecAdapter> {
        self.adapters
            .iter()
            .find(|a| a.kind() == kind)
            .map(|a| a.as_ref())
            .ok_or(Error::CodecNotConfigured(kind))
    }

    /// Compress the corpus under `kind` at `level`; returns the compressed length.
    pub fn compress(&self, kind: CodecKind, level: u32) -> Result<usize> {
        let adapter = self.adapter(kind)?;
        let out = codec::compress_with(adapter, self.corpus.as_bytes(), level, self.config.write_chunk_size)
            .map_err(|e| CodecError::new(kind, level, Direction::Compress, e))?;
        Ok(out.len())
    }

    /// Decompress the cached artifact for `kind` at `level`; returns the
    /// decompressed length. The output is not compared with the corpus, see
    /// [`check_cached`](Self::check_cached).
    pub fn decompress(&self, kind: CodecKind, level: u32) -> Result<usize> {
        Ok(self.decode_cached(kind, level)?.1.len())
    }

    /// Round-trip the corpus under `kind` at `level`.
    pub fn verify(&self, kind: CodecKind, level: u32) -> Result<VerificationResult> {
        let adapter = self.adapter(kind)?;
        let result = verify::verify_with(
            adapter,
            self.corpus.as_bytes(),
            level,
            self.config.read_chunk_size,
            self.config.write_chunk_size,
        )?;
        Ok(result)
    }

    /// Decompress the cached artifact and insist it reproduces the corpus exactly.
    pub fn check_cached(&self, kind: CodecKind, level: u32) -> Result<VerificationResult> {
        let (artifact_len, recovered) = self.decode_cached(kind, level)?;
        self.check_recovered(kind, level, artifact_len, &recovered)
    }

    /// Cached artifact length and its decoded bytes.
    fn decode_cached(&self, kind: CodecKind, level: u32) -> Result<(usize, Vec<u8>)> {
        let adapter = self.adapter(kind)?;
        let artifact = self
            .cache
            .get(CellKey::new(kind, level))
            .ok_or(Error::MissingArtifact { codec: kind, level })?;
        let recovered = codec::decompress_with(adapter, artifact, self.config.read_chunk_size, self.corpus.len())
            .map_err(|e| CodecError::new(kind, level, Direction::Decompress, e))?;
        Ok((artifact.len(), recovered))
    }

    fn check_recovered(
        &self,
        kind: CodecKind,
        level: u32,
        artifact_len: usize,
        recovered: &[u8],
    ) -> Result<VerificationResult> {
        let result = VerificationResult::compare(self.corpus.as_bytes(), artifact_len, recovered);
        result.check(kind, level)?;
        Ok(result)
    }

    fn keys(&self) -> Vec<CellKey> {
        self.adapters
            .iter()
            .flat_map(|a| self.levels.iter().map(move |&level| CellKey::new(a.kind(), level)))
            .collect()
    }

    /// Time one cell. Decompressed output is compared with the corpus after
    /// the clock stops; a mismatch fails the cell.
    fn execute(&self, key: CellKey, direction: Direction) -> CellOutcome {
        let (result, elapsed) = match direction {
            Direction::Compress => {
                let start = Instant::now();
                let result = self.compress(key.codec, key.level);
                (result, start.elapsed())
            }
            Direction::Decompress => {
                let start = Instant::now();
                let decoded = self.decode_cached(key.codec, key.level);
                let elapsed = start.elapsed();
                let result = decoded.and_then(|(artifact_len, recovered)| {
                    self.check_recovered(key.codec, key.level, artifact_len, &recovered)?;
                    Ok(recovered.len())
                });
                (result, elapsed)
            }
        };
        match result {
            Ok(output_len) => {
                let processed = match direction {
                    Direction::Compress => self.corpus.len(),
                    Direction::Decompress => output_len,
                };
                tracing::debug!(cell = %key, %direction, output_len, ?elapsed, "cell done");
                CellOutcome::ok(key, direction, output_len, processed, elapsed)
            }
            Err(e) => {
                tracing::warn!(cell = %key, %direction, error = %e, "cell failed");
                CellOutcome::failed(key, direction, e)
            }
        }
    }

    fn verification_outcome(&self, key: CellKey) -> VerificationOutcome {
        let status = match self.verify(key.codec, key.level) {
            Ok(result) => match result.check(key.codec, key.level) {
                Ok(()) => VerificationStatus::Passed { result },
                Err(failure) => VerificationStatus::Mismatch { result, failure },
            },
            Err(e) => VerificationStatus::Error { cause: e.to_string() },
        };
        VerificationOutcome {
            codec: key.codec,
            level: key.level,
            status,
        }
    }

    /// Compressed size and round-trip verdict for every codec and level.
    pub fn size_survey(&self) -> Vec<VerificationOutcome> {
        let keys = self.keys();
        let mut outcomes: Vec<VerificationOutcome> = if self.config.parallel {
            keys.par_iter().map(|&key| self.verification_outcome(key)).collect()
        } else {
            keys.iter().map(|&key| self.verification_outcome(key)).collect()
        };
        outcomes.sort_by_key(|v| (v.codec, v.level));
        outcomes
    }

    /// Execute every configured cell once and collect the outcomes.
    pub fn run(&self) -> MatrixReport {
        let failed_at_setup: BTreeSet<CellKey> = self
            .setup_failures
            .iter()
            .map(|e| CellKey::new(e.codec, e.level))
            .collect();

        let mut cells: Vec<(CellKey, Direction)> = Vec::new();
        for key in self.keys() {
            if self.config.measure_compression {
                cells.push((key, Direction::Compress));
            }
            if self.config.measure_decompression && !failed_at_setup.contains(&key) {
                cells.push((key, Direction::Decompress));
            }
        }

        let mut outcomes: Vec<CellOutcome> = if self.config.parallel {
            cells.par_iter().map(|&(key, dir)| self.execute(key, dir)).collect()
        } else {
            cells.iter().map(|&(key, dir)| self.execute(key, dir)).collect()
        };
        outcomes.extend(self.setup_failures.iter().map(|e| {
            CellOutcome::failed(CellKey::new(e.codec, e.level), Direction::Decompress, e)
        }));

        let verifications = if self.config.verify {
            self.size_survey()
        } else {
            Vec::new()
        };

        let limit = self.corpus.len() + self.config.size_overhead_allowance;
        let oversized_cells = outcomes
            .iter()
            .filter(|c| c.direction == Direction::Compress)
            .filter_map(|c| c.output_len().filter(|&len| len > limit).map(|_| c.key()));
        let oversized_verified = verifications
            .iter()
            .filter_map(|v| v.result().filter(|r| r.compressed_len > limit).map(|_| v.key()));
        let oversized: Vec<CellKey> = oversized_cells.chain(oversized_verified).collect();
        for key in &oversized {
            tracing::warn!(cell = %key, corpus_bytes = self.corpus.len(), "compressed output exceeds input");
        }

        let report = MatrixReport::new(self.corpus.len(), outcomes, verifications, oversized);
        let summary = report.summary();
        tracing::info!(
            cells_ok = summary.cells_ok,
            cells_failed = summary.cells_failed,
            verifications_failed = summary.verifications_failed,
            "matrix run complete"
        );
        report
    }

    /// Run the matrix, then tear the session down.
    pub fn finish(self) -> MatrixReport {
        self.run()
    }
}

impl Drop for BenchSession {
    fn drop(&mut self) {
        tracing::debug!(
            artifacts = self.cache.len(),
            bytes = self.cache.total_bytes(),
            "discarding precomputed artifacts"
        );
    }
}
