use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::codec::{self, CodecAdapter};
use crate::config::{CodecKind, Direction};
use crate::error::CodecError;

/// One (codec, level) coordinate of the benchmark matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellKey {
    pub codec: CodecKind,
    pub level: u32,
}

impl CellKey {
    pub fn new(codec: CodecKind, level: u32) -> Self {
        Self { codec, level }
    }
}

impl std::fmt::Display for CellKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} level {}", self.codec, self.level)
    }
}

/// Compressed corpus per (codec, level), so decompression cells never pay for
/// compression. Filled once by [`populate`](Self::populate), read-only afterwards.
#[derive(Debug, Default)]
pub struct PrecomputedCache {
    artifacts: HashMap<CellKey, Vec<u8>>,
}

impl PrecomputedCache {
    /// Compress `corpus` once for every adapter and distinct level.
    ///
    /// All writes complete before this returns. Keys whose compression failed
    /// are absent from the cache and reported in the returned errors.
    pub fn populate(
        adapters: &[Arc<dyn CodecAdapter>],
        levels: &[u32],
        corpus: &[u8],
        parallel: bool,
    ) -> (Self, Vec<CodecError>) {
        let levels: BTreeSet<u32> = levels.iter().copied().collect();
        let jobs: Vec<(&dyn CodecAdapter, u32)> = adapters
            .iter()
            .flat_map(|adapter| levels.iter().map(move |&level| (adapter.as_ref(), level)))
            .collect();

        let run = |&(adapter, level): &(&dyn CodecAdapter, u32)| {
            let key = CellKey::new(adapter.kind(), level);
            let artifact = codec::compress(adapter, corpus, level)
                .map_err(|e| CodecError::new(key.codec, level, Direction::Compress, e));
            (key, artifact)
        };
        let results: Vec<_> = if parallel {
            jobs.par_iter().map(run).collect()
        } else {
            jobs.iter().map(run).collect()
        };

        let mut cache = Self::default();
        let mut failures = Vec::new();
        for (key, artifact) in results {
            match artifact {
                Ok(bytes) => {
                    cache.artifacts.insert(key, bytes);
                }
                Err(e) => {
                    tracing::warn!(cell = %key, error = %e, "precompute failed");
                    failures.push(e);
                }
            }
        }
        tracing::info!(
            artifacts = cache.artifacts.len(),
            failed = failures.len(),
            "precomputed compressed artifacts"
        );
        (cache, failures)
    }

    pub fn get(&self, key: CellKey) -> Option<&[u8]> {
        self.artifacts.get(&key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: CellKey) -> bool {
        self.artifacts.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Bytes held across all artifacts.
    pub fn total_bytes(&self) -> usize {
        self.artifacts.values().map(Vec::len).sum()
    }
}
