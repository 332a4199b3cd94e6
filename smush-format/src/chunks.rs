//! Generic sub-chunk enumeration, grounded on
//! `symphonia_format_riff::chunks::ChunksReader`: wrap a reader, track how
//! many bytes remain in the enclosing chunk, and hand back one
//! `(tag, size)` header at a time, re-aligning to the next chunk regardless
//! of how much of the payload the caller actually consumed.

use smush_core::error::Result;
use smush_core::io::ReadBytes;

use crate::tag::FourCc;

/// One sub-chunk header: its tag, declared payload size, and the absolute
/// position its payload starts at.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    pub tag: FourCc,
    pub size: u32,
    pub payload_pos: u64,
}

impl ChunkHeader {
    /// Absolute position of the byte immediately following this chunk,
    /// including the word-alignment pad byte if the size is odd.
    pub fn end_pos(&self) -> u64 {
        self.payload_pos + self.size as u64 + (self.size & 1) as u64
    }
}

/// Iterates sub-chunks nested inside an enclosing chunk of `len` bytes,
/// starting at the reader's current position.
pub struct ChunksReader {
    end_pos: u64,
}

impl ChunksReader {
    pub fn new<R: ReadBytes>(reader: &R, len: u64) -> Self {
        ChunksReader {
            end_pos: reader.pos() + len,
        }
    }

    /// Reads the next sub-chunk header, or `None` if the enclosing chunk is
    /// exhausted. Does not seek past the header; the caller is responsible
    /// for consuming (or skipping) the payload before calling `next` again,
    /// or for calling [`ChunksReader::skip_to_next`] to force realignment.
    pub fn next<R: ReadBytes>(&mut self, reader: &mut R) -> Result<Option<ChunkHeader>> {
        if reader.pos() >= self.end_pos {
            return Ok(None);
        }
        let tag = FourCc::from_u32_be(reader.read_u32_be()?);
        let size = reader.read_u32_be()?;
        let payload_pos = reader.pos();
        Ok(Some(ChunkHeader {
            tag,
            size,
            payload_pos,
        }))
    }

    /// Seeks `reader` to exactly the start of the next chunk header,
    /// regardless of how much of `header`'s payload was consumed. This is
    /// the "strict post-seek realignment" rule: a handler that reads less
    /// (or more, via `ignore_bytes`-bounded helpers) than `header.size`
    /// never desynchronizes the outer iteration.
    pub fn skip_to_next<R: ReadBytes>(&self, reader: &mut R, header: &ChunkHeader) -> Result<()> {
        let target = header.end_pos();
        let cur = reader.pos();
        if target > cur {
            reader.ignore_bytes(target - cur)?;
        }
        Ok(())
    }

    pub fn end_pos(&self) -> u64 {
        self.end_pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smush_core::io::BufReader;

    fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(tag);
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        if payload.len() & 1 != 0 {
            out.push(0);
        }
        out
    }

    #[test]
    fn iterates_and_realigns_on_partial_consumption() {
        let mut data = Vec::new();
        data.extend(chunk(b"AAAA", &[1, 2, 3])); // odd size -> padded
        data.extend(chunk(b"BBBB", &[9, 9, 9, 9]));
        let total_len = data.len() as u64;

        let mut r = BufReader::new(&data);
        let mut chunks = ChunksReader::new(&r, total_len);

        let h1 = chunks.next(&mut r).unwrap().unwrap();
        assert_eq!(h1.tag, FourCc::new(b"AAAA"));
        assert_eq!(h1.size, 3);
        // Only read 1 of 3 payload bytes.
        use smush_core::io::ReadBytes as _;
        let _ = r.read_byte().unwrap();
        chunks.skip_to_next(&mut r, &h1).unwrap();

        let h2 = chunks.next(&mut r).unwrap().unwrap();
        assert_eq!(h2.tag, FourCc::new(b"BBBB"));
        assert_eq!(h2.size, 4);
        chunks.skip_to_next(&mut r, &h2).unwrap();

        assert!(chunks.next(&mut r).unwrap().is_none());
    }
}
