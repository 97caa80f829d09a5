pub mod cache;
pub mod codec;
mod codec_bzip2;
mod codec_deflate;
mod codec_gzip;
mod config;
mod corpus;
mod error;
mod matrix;
mod report;
pub mod verify;

pub use cache::{CellKey, PrecomputedCache};
pub use codec::{CodecAdapter, CompressingSink, DecompressingSource, adapter_for};
pub use codec_bzip2::Bzip2Adapter;
pub use codec_deflate::DeflateAdapter;
pub use codec_gzip::{GzipAdapter, MultiGzipAdapter};
pub use config::{CodecKind, CodecOptions, DEFAULT_CORPUS_PATH, DEFAULT_LEVELS, Direction, HarnessConfig};
pub use corpus::Corpus;
pub use error::{Check, CodecError, Error, Result, VerificationFailure};
pub use matrix::BenchSession;
pub use report::{CellOutcome, CellStatus, MatrixReport, Summary, VerificationOutcome, VerificationStatus};
pub use verify::{VerificationResult, verify};
