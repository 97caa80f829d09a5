use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::codec_bzip2::Bzip2Adapter;
use crate::codec_deflate::DeflateAdapter;
use crate::codec_gzip::{GzipAdapter, MultiGzipAdapter};
use crate::config::{CodecKind, CodecOptions};

/// Read buffer used when the caller does not pick one.
pub const DEFAULT_READ_CHUNK: usize = 8 * 1024;

/// Largest slice handed to a single compressor write when the caller does not pick one.
pub const DEFAULT_WRITE_CHUNK: usize = 8 * 1024;

/// Writable end of a compressor.
///
/// Bytes written here are not a complete stream until [`finalize`](Self::finalize)
/// returns: encoders buffer input and only emit their trailer on close.
pub trait CompressingSink: Write {
    /// Flush everything and write the stream trailer into the destination.
    fn finalize(self: Box<Self>) -> io::Result<()>;
}

/// Readable end of a decompressor. Dropping it releases the backend.
pub type DecompressingSource<'a> = Box<dyn Read + 'a>;

/// Uniform streaming contract every compression backend is plugged in through.
///
/// Adapters own no state across calls beyond their fixed options, so one value
/// can serve any number of cells, concurrently.
pub trait CodecAdapter: Send + Sync {
    fn kind(&self) -> CodecKind;

    /// Open a compressor depositing its output into `destination`.
    ///
    /// `level` is forwarded to the backend as-is. Values outside 1..=9 are a
    /// precondition violation the backend either clamps or rejects.
    fn open_compressor<'a>(
        &self,
        destination: &'a mut dyn Write,
        level: u32,
    ) -> io::Result<Box<dyn CompressingSink + 'a>>;

    /// Open a decompressor over `source`. Reading it to exhaustion yields the
    /// original bytes, however small the caller's read buffer is.
    fn open_decompressor<'a>(&self, source: &'a mut dyn Read) -> io::Result<DecompressingSource<'a>>;
}

/// Select the implementation for `kind`.
pub fn adapter_for(kind: CodecKind, options: &CodecOptions) -> Arc<dyn CodecAdapter> {
    match kind {
        CodecKind::Gzip => Arc::new(GzipAdapter),
        CodecKind::GzipMulti => Arc::new(MultiGzipAdapter::new(options.gzip_filename.clone())),
        CodecKind::Bzip2 => Arc::new(Bzip2Adapter),
        CodecKind::Deflate => Arc::new(DeflateAdapter::new(options.deflate_zlib_header)),
    }
}

/// Compress `input` fully into a fresh buffer with [`DEFAULT_WRITE_CHUNK`] sized writes.
pub fn compress(adapter: &dyn CodecAdapter, input: &[u8], level: u32) -> io::Result<Vec<u8>> {
    compress_with(adapter, input, level, DEFAULT_WRITE_CHUNK)
}

/// Compress `input` by writing at most `chunk_size` bytes at a time.
///
/// The sink is finalized even when a write fails; the write error wins.
pub fn compress_with(adapter: &dyn CodecAdapter, input: &[u8], level: u32, chunk_size: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() / 2 + 64);
    let mut sink = adapter.open_compressor(&mut out, level)?;
    let written = input
        .chunks(chunk_size.max(1))
        .try_for_each(|chunk| sink.write_all(chunk));
    let finished = sink.finalize();
    written?;
    finished?;
    Ok(out)
}

/// Decompress `input` fully with [`DEFAULT_READ_CHUNK`] sized reads.
pub fn decompress(adapter: &dyn CodecAdapter, input: &[u8]) -> io::Result<Vec<u8>> {
    decompress_with(adapter, input, DEFAULT_READ_CHUNK, 0)
}

/// Decompress `input` by reading `chunk_size` bytes at a time until end of stream.
pub fn decompress_with(
    adapter: &dyn CodecAdapter,
    input: &[u8],
    chunk_size: usize,
    size_hint: usize,
) -> io::Result<Vec<u8>> {
    let mut source = input;
    let mut reader = adapter.open_decompressor(&mut source)?;
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut out = Vec::with_capacity(size_hint);
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => out.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}
