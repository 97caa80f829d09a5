use std::path::PathBuf;

use serde::Serialize;

/// Compression levels swept by default: best speed (1) through best compression (9).
pub const DEFAULT_LEVELS: std::ops::RangeInclusive<u32> = 1..=9;

/// Corpus file read when no other path is configured.
pub const DEFAULT_CORPUS_PATH: &str = "./THIRDPARTYLICENSEREADME.txt";

/// Codec backends that can be plugged into the harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum CodecKind {
    /// Single-member gzip through flate2's default encoder.
    Gzip,
    /// gzip with an explicitly built header, decoded as a multi-member stream.
    GzipMulti,
    Bzip2,
    /// zlib-wrapped (or raw) deflate.
    Deflate,
}

impl CodecKind {
    pub const ALL: [CodecKind; 4] = [
        CodecKind::Gzip,
        CodecKind::GzipMulti,
        CodecKind::Bzip2,
        CodecKind::Deflate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CodecKind::Gzip => "gzip",
            CodecKind::GzipMulti => "gzip-multi",
            CodecKind::Bzip2 => "bzip2",
            CodecKind::Deflate => "deflate",
        }
    }
}

impl std::fmt::Display for CodecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CodecKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodecKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown codec {s:?}; expected one of gzip, gzip-multi, bzip2, deflate"))
    }
}

/// Which way a cell pushes bytes through a codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Compress,
    Decompress,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Compress => f.write_str("compress"),
            Direction::Decompress => f.write_str("decompress"),
        }
    }
}

/// Backend knobs that are not the compression level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    /// Wrap deflate output in a zlib header and adler32 trailer.
    pub deflate_zlib_header: bool,
    /// File name embedded in the `gzip-multi` header.
    pub gzip_filename: Option<String>,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            deflate_zlib_header: true,
            gzip_filename: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessConfig {
    pub corpus_path: PathBuf,
    pub codecs: Vec<CodecKind>,
    /// Forwarded to the backends untouched; 1..=9 is the meaningful range.
    pub levels: Vec<u32>,
    pub measure_compression: bool,
    /// Also controls whether compressed artifacts are precomputed at setup.
    pub measure_decompression: bool,
    /// Run the round-trip verifier for every codec and level.
    pub verify: bool,
    /// Execute cells on the rayon pool instead of the calling thread.
    pub parallel: bool,
    /// Bytes a compressed output may exceed its input by before it is flagged.
    pub size_overhead_allowance: usize,
    /// Buffer size handed to each read of a decompressing source.
    pub read_chunk_size: usize,
    /// Largest slice handed to each write of a compressing sink.
    pub write_chunk_size: usize,
    pub options: CodecOptions,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from(DEFAULT_CORPUS_PATH),
            codecs: CodecKind::ALL.to_vec(),
            levels: DEFAULT_LEVELS.collect(),
            measure_compression: true,
            measure_decompression: true,
            verify: true,
            parallel: false,
            size_overhead_allowance: 128,
            read_chunk_size: crate::codec::DEFAULT_READ_CHUNK,
            write_chunk_size: crate::codec::DEFAULT_WRITE_CHUNK,
            options: CodecOptions::default(),
        }
    }
}
