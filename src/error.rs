use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::config::{CodecKind, Direction};

/// A backend failure while driving one (codec, level, direction) cell.
#[derive(Error, Debug)]
#[error("{codec} level {level} {direction}: {source}")]
pub struct CodecError {
    pub codec: CodecKind,
    pub level: u32,
    pub direction: Direction,
    #[source]
    pub source: std::io::Error,
}

impl CodecError {
    pub fn new(codec: CodecKind, level: u32, direction: Direction, source: std::io::Error) -> Self {
        Self {
            codec,
            level,
            direction,
            source,
        }
    }
}

/// The comparison a failed round trip tripped over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Check {
    Length,
    Bytes,
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Check::Length => f.write_str("length"),
            Check::Bytes => f.write_str("byte"),
        }
    }
}

/// Round-trip mismatch. Always a defect in the adapter, never transient.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize)]
#[error(
    "{codec} level {level}: round-trip {check} mismatch (original {original_len} bytes, recovered {recovered_len} bytes{})",
    .first_mismatch.map(|at| format!(", first difference at offset {at}")).unwrap_or_default()
)]
pub struct VerificationFailure {
    pub codec: CodecKind,
    pub level: u32,
    pub check: Check,
    pub original_len: usize,
    pub recovered_len: usize,
    pub first_mismatch: Option<usize>,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("setup: cannot read corpus {}: {source}", .path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Verification(#[from] VerificationFailure),
    #[error("no precomputed artifact for {codec} level {level}")]
    MissingArtifact { codec: CodecKind, level: u32 },
    #[error("codec {0} is not configured for this session")]
    CodecNotConfigured(CodecKind),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Only setup failures abort a session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Setup { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_setup_error() {
        let err = Error::Setup {
            path: PathBuf::from("/nope/corpus.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("setup: cannot read corpus /nope/corpus.txt"), "got: {msg}");
        assert!(err.is_fatal());
    }

    #[test]
    fn display_codec_error() {
        let err = Error::Codec(CodecError::new(
            CodecKind::Bzip2,
            4,
            Direction::Decompress,
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated"),
        ));
        assert_eq!(err.to_string(), "bzip2 level 4 decompress: truncated");
        assert!(!err.is_fatal());
    }

    #[test]
    fn display_verification_failure_with_offset() {
        let failure = VerificationFailure {
            codec: CodecKind::Deflate,
            level: 9,
            check: Check::Bytes,
            original_len: 10,
            recovered_len: 10,
            first_mismatch: Some(3),
        };
        assert_eq!(
            failure.to_string(),
            "deflate level 9: round-trip byte mismatch (original 10 bytes, recovered 10 bytes, first difference at offset 3)"
        );
    }

    #[test]
    fn display_verification_failure_without_offset() {
        let failure = VerificationFailure {
            codec: CodecKind::Gzip,
            level: 1,
            check: Check::Length,
            original_len: 10,
            recovered_len: 7,
            first_mismatch: None,
        };
        assert_eq!(
            failure.to_string(),
            "gzip level 1: round-trip length mismatch (original 10 bytes, recovered 7 bytes)"
        );
    }

    #[test]
    fn display_missing_artifact() {
        let err = Error::MissingArtifact {
            codec: CodecKind::GzipMulti,
            level: 5,
        };
        assert_eq!(err.to_string(), "no precomputed artifact for gzip-multi level 5");
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn codec_error_keeps_source() {
        use std::error::Error as _;
        let err = CodecError::new(
            CodecKind::Gzip,
            2,
            Direction::Compress,
            std::io::Error::new(std::io::ErrorKind::WriteZero, "sink full"),
        );
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("sink full"));
    }
}
