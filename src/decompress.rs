//! Streaming gzip decompression of fetched chunks.

use std::io::{ErrorKind, Read};

use bytes::{buf::Reader, Buf, Bytes};
use flate2::read::MultiGzDecoder;

use crate::error::{Error, Result};

/// Capacity of the block buffer decompressed chunks are read through (64 MiB)
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024 * 1024;

/// Produces the decompressed contents of one chunk as a sequence of blocks.
///
/// Blocks are never empty and never larger than the block buffer. The sequence ends on the first
/// `Ok(None)` or error, after which the stream stays exhausted.
pub struct DecompressionStream<'b> {
    chunk_id: u32,
    decoder: Option<MultiGzDecoder<Reader<Bytes>>>,
    buf: &'b mut [u8],
}

impl<'b> DecompressionStream<'b> {
    /// Decode `compressed` through `buf`, which sets the largest block size.
    ///
    /// # Panics
    ///
    /// If `buf` is empty, since a zero-length read can't be told apart from end of stream.
    pub fn new(chunk_id: u32, compressed: Bytes, buf: &'b mut [u8]) -> Self {
        assert!(!buf.is_empty(), "Block buffer must not be empty");

        Self {
            chunk_id,
            decoder: Some(MultiGzDecoder::new(compressed.reader())),
            buf,
        }
    }

    /// Decompress the next block into the block buffer
    pub fn next_block(&mut self) -> Result<Option<&[u8]>> {
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(None);
        };

        loop {
            match decoder.read(self.buf) {
                Ok(0) => {
                    self.decoder = None;
                    return Ok(None);
                }
                Ok(read) => return Ok(Some(&self.buf[..read])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    self.decoder = None;
                    return Err(Error::CorruptData {
                        chunk_id: self.chunk_id,
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};

    use super::*;

    pub(crate) fn gzip(data: &[u8]) -> Bytes {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        Bytes::from(encoder.finish().unwrap())
    }

    /// Bytes that don't compress away to nothing
    pub(crate) fn noise(len: usize, seed: u32) -> Vec<u8> {
        let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                (state >> 24) as u8
            })
            .collect()
    }

    fn drain(stream: &mut DecompressionStream) -> Result<Vec<u8>> {
        let mut out = vec![];
        while let Some(block) = stream.next_block()? {
            out.extend_from_slice(block);
        }
        Ok(out)
    }

    #[test]
    fn blocks_are_bounded_and_ordered() {
        let data = noise(10_000, 1);
        let mut buf = vec![0; 1000];
        let mut stream = DecompressionStream::new(1, gzip(&data), &mut buf);

        let mut out = vec![];
        while let Some(block) = stream.next_block().unwrap() {
            assert!(!block.is_empty() && block.len() <= 1000);
            out.extend_from_slice(block);
        }
        assert_eq!(out, data);

        // Exhausted for good
        assert!(stream.next_block().unwrap().is_none());
    }

    #[test]
    #[should_panic(expected = "Block buffer must not be empty")]
    fn empty_block_buffer_panics() {
        let mut buf: Vec<u8> = vec![];
        DecompressionStream::new(1, gzip(b"data"), &mut buf);
    }

    #[test]
    fn concatenated_members_are_all_decoded() {
        let mut compressed = gzip(b"first ").to_vec();
        compressed.extend_from_slice(&gzip(b"second"));

        let mut buf = vec![0; 64];
        let mut stream = DecompressionStream::new(1, Bytes::from(compressed), &mut buf);
        assert_eq!(drain(&mut stream).unwrap(), b"first second");
    }

    #[test]
    fn garbage_is_corrupt() {
        let mut buf = vec![0; 64];
        let mut stream =
            DecompressionStream::new(7, Bytes::from_static(b"definitely not gzip"), &mut buf);

        let err = drain(&mut stream).unwrap_err();
        assert!(matches!(err, Error::CorruptData { chunk_id: 7, .. }));
        assert!(stream.next_block().unwrap().is_none());
    }

    #[test]
    fn truncated_stream_is_corrupt() {
        let compressed = gzip(&noise(10_000, 2));
        let truncated = compressed.slice(..compressed.len() / 2);

        let mut buf = vec![0; 1024];
        let mut stream = DecompressionStream::new(3, truncated, &mut buf);
        assert!(matches!(
            drain(&mut stream),
            Err(Error::CorruptData { chunk_id: 3, .. })
        ));
    }

    #[test]
    fn checksum_mismatch_is_corrupt() {
        let mut compressed = gzip(&noise(2_000, 3)).to_vec();
        let crc_offset = compressed.len() - 8;
        compressed[crc_offset] ^= 0xff;

        let mut buf = vec![0; 1024];
        let mut stream = DecompressionStream::new(4, Bytes::from(compressed), &mut buf);
        assert!(matches!(
            drain(&mut stream),
            Err(Error::CorruptData { chunk_id: 4, .. })
        ));
    }
}
