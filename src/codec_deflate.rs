use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};

use crate::codec::{CodecAdapter, CompressingSink, DecompressingSource};
use crate::config::CodecKind;

impl<W: Write> CompressingSink for ZlibEncoder<W> {
    fn finalize(self: Box<Self>) -> io::Result<()> {
        (*self).finish().map(drop)
    }
}

impl<W: Write> CompressingSink for DeflateEncoder<W> {
    fn finalize(self: Box<Self>) -> io::Result<()> {
        (*self).finish().map(drop)
    }
}

/// Deflate, zlib-wrapped unless configured for raw blocks.
pub struct DeflateAdapter {
    zlib_header: bool,
}

impl DeflateAdapter {
    pub fn new(zlib_header: bool) -> Self {
        Self { zlib_header }
    }
}

impl CodecAdapter for DeflateAdapter {
    fn kind(&self) -> CodecKind {
        CodecKind::Deflate
    }

    fn open_compressor<'a>(
        &self,
        destination: &'a mut dyn Write,
        level: u32,
    ) -> io::Result<Box<dyn CompressingSink + 'a>> {
        let level = Compression::new(level);
        if self.zlib_header {
            Ok(Box::new(ZlibEncoder::new(destination, level)))
        } else {
            Ok(Box::new(DeflateEncoder::new(destination, level)))
        }
    }

    fn open_decompressor<'a>(&self, source: &'a mut dyn Read) -> io::Result<DecompressingSource<'a>> {
        if self.zlib_header {
            Ok(Box::new(ZlibDecoder::new(source)))
        } else {
            Ok(Box::new(DeflateDecoder::new(source)))
        }
    }
}
