use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Immutable input bytes, loaded once per session and shared read-only by every cell.
#[derive(Clone, Debug)]
pub struct Corpus {
    bytes: Arc<[u8]>,
}

impl Corpus {
    /// Read the whole file into memory. Any failure is a setup error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::Setup {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "corpus loaded");
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_reads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"corpus contents").unwrap();
        let corpus = Corpus::load(file.path()).unwrap();
        assert_eq!(corpus.as_bytes(), b"corpus contents");
        assert_eq!(corpus.len(), 15);
    }

    #[test]
    fn load_missing_file_is_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        let err = Corpus::load(&path).unwrap_err();
        match err {
            Error::Setup { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected setup error, got {other:?}"),
        }
    }

    #[test]
    fn clones_share_the_buffer() {
        let corpus = Corpus::from_bytes(vec![1u8, 2, 3]);
        let copy = corpus.clone();
        assert!(std::ptr::eq(corpus.as_bytes(), copy.as_bytes()));
    }

    #[test]
    fn empty_corpus() {
        let corpus = Corpus::from_bytes(Vec::new());
        assert!(corpus.is_empty());
        assert_eq!(corpus.len(), 0);
    }
}
