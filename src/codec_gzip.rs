use std::io::{self, Read, Write};

use flate2::read::{GzDecoder, MultiGzDecoder};
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};

use crate::codec::{CodecAdapter, CompressingSink, DecompressingSource};
use crate::config::CodecKind;

impl<W: Write> CompressingSink for GzEncoder<W> {
    fn finalize(self: Box<Self>) -> io::Result<()> {
        (*self).finish().map(drop)
    }
}

/// Plain single-member gzip.
pub struct GzipAdapter;

impl CodecAdapter for GzipAdapter {
    fn kind(&self) -> CodecKind {
        CodecKind::Gzip
    }

    fn open_compressor<'a>(
        &self,
        destination: &'a mut dyn Write,
        level: u32,
    ) -> io::Result<Box<dyn CompressingSink + 'a>> {
        Ok(Box::new(GzEncoder::new(destination, Compression::new(level))))
    }

    fn open_decompressor<'a>(&self, source: &'a mut dyn Read) -> io::Result<DecompressingSource<'a>> {
        Ok(Box::new(GzDecoder::new(source)))
    }
}

/// gzip whose header is spelled out field by field and whose reader accepts
/// concatenated members.
pub struct MultiGzipAdapter {
    filename: Option<String>,
}

impl MultiGzipAdapter {
    pub fn new(filename: Option<String>) -> Self {
        Self { filename }
    }
}

impl CodecAdapter for MultiGzipAdapter {
    fn kind(&self) -> CodecKind {
        CodecKind::GzipMulti
    }

    fn open_compressor<'a>(
        &self,
        destination: &'a mut dyn Write,
        level: u32,
    ) -> io::Result<Box<dyn CompressingSink + 'a>> {
        let mut builder = GzBuilder::new().mtime(0);
        if let Some(name) = &self.filename {
            // The header stores the name NUL-terminated.
            if name.as_bytes().contains(&0) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "gzip file name must not contain NUL bytes",
                ));
            }
            builder = builder.filename(name.as_bytes());
        }
        Ok(Box::new(builder.write(destination, Compression::new(level))))
    }

    fn open_decompressor<'a>(&self, source: &'a mut dyn Read) -> io::Result<DecompressingSource<'a>> {
        Ok(Box::new(MultiGzDecoder::new(source)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{compress, decompress};

    #[test]
    fn gzip_roundtrip() {
        let data = b"roundtrip test data for gzip compression";
        let packed = compress(&GzipAdapter, data, 6).unwrap();
        assert_eq!(&packed[..2], &[0x1f, 0x8b]);
        assert_eq!(decompress(&GzipAdapter, &packed).unwrap(), data);
    }

    #[test]
    fn gzip_header_has_no_timestamp() {
        let packed = compress(&GzipAdapter, b"stable", 1).unwrap();
        assert_eq!(&packed[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn gzip_rejects_garbage() {
        let err = decompress(&GzipAdapter, b"definitely not a gzip stream").unwrap_err();
        assert_ne!(err.kind(), io::ErrorKind::Interrupted);
    }

    #[test]
    fn multi_gzip_embeds_filename() {
        let adapter = MultiGzipAdapter::new(Some("corpus.txt".into()));
        let packed = compress(&adapter, b"named payload", 9).unwrap();
        // FLG.FNAME
        assert_ne!(packed[3] & 0x08, 0);
        assert!(packed[10..].starts_with(b"corpus.txt\0"));
        assert_eq!(decompress(&adapter, &packed).unwrap(), b"named payload");
    }

    #[test]
    fn multi_gzip_rejects_nul_in_filename() {
        let adapter = MultiGzipAdapter::new(Some("bad\0name".into()));
        let err = compress(&adapter, b"x", 5).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn multi_gzip_reads_concatenated_members() {
        let adapter = MultiGzipAdapter::new(None);
        let mut packed = compress(&adapter, b"first member, ", 3).unwrap();
        packed.extend(compress(&adapter, b"second member", 7).unwrap());
        let out = decompress(&adapter, &packed).unwrap();
        assert_eq!(out, b"first member, second member");
    }

    #[test]
    fn gzip_variants_read_each_other() {
        let data = b"interchangeable framing";
        let from_plain = compress(&GzipAdapter, data, 4).unwrap();
        let from_multi = compress(&MultiGzipAdapter::new(None), data, 4).unwrap();
        assert_eq!(decompress(&MultiGzipAdapter::new(None), &from_plain).unwrap(), data);
        assert_eq!(decompress(&GzipAdapter, &from_multi).unwrap(), data);
    }
}
