use std::io::{self, Read, Write};

use bzip2::Compression;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;

use crate::codec::{CodecAdapter, CompressingSink, DecompressingSource};
use crate::config::CodecKind;

impl<W: Write> CompressingSink for BzEncoder<W> {
    fn finalize(self: Box<Self>) -> io::Result<()> {
        (*self).finish().map(drop)
    }
}

/// bzip2, with the level read as the block size in 100k units.
pub struct Bzip2Adapter;

impl CodecAdapter for Bzip2Adapter {
    fn kind(&self) -> CodecKind {
        CodecKind::Bzip2
    }

    fn open_compressor<'a>(
        &self,
        destination: &'a mut dyn Write,
        level: u32,
    ) -> io::Result<Box<dyn CompressingSink + 'a>> {
        // libbzip2 refuses other block sizes by aborting in the binding.
        if !(1..=9).contains(&level) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("bzip2 block size must be 1..=9, got {level}"),
            ));
        }
        Ok(Box::new(BzEncoder::new(destination, Compression::new(level))))
    }

    fn open_decompressor<'a>(&self, source: &'a mut dyn Read) -> io::Result<DecompressingSource<'a>> {
        Ok(Box::new(BzDecoder::new(source)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{compress, decompress};

    #[test]
    fn roundtrip() {
        let data = b"test data for bzip2 backend roundtrip verification";
        let packed = compress(&Bzip2Adapter, data, 9).unwrap();
        assert_eq!(decompress(&Bzip2Adapter, &packed).unwrap(), data);
    }

    #[test]
    fn header_records_block_size() {
        for level in 1..=9u32 {
            let packed = compress(&Bzip2Adapter, b"block size", level).unwrap();
            assert_eq!(&packed[..3], b"BZh");
            assert_eq!(packed[3], b'0' + level as u8);
        }
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        for level in [0, 10, 42] {
            let err = compress(&Bzip2Adapter, b"x", level).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn empty_input_roundtrip() {
        let packed = compress(&Bzip2Adapter, b"", 5).unwrap();
        assert!(!packed.is_empty());
        assert!(decompress(&Bzip2Adapter, &packed).unwrap().is_empty());
    }
}
