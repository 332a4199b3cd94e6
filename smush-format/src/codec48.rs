//! Codec 48: a motion-compensated inter-frame video codec used by later
//! SMUSH titles.
//!
//! `SPEC_FULL.md` specifies this codec only as an external-collaborator
//! interface ("after `decode`, the back-buffer holds the decoded frame") —
//! its internal algorithm is not part of this source material. The
//! implementation below is a best-effort glyph/copy/fill decoder in that
//! spirit, not a claim of bit-exact compatibility with any particular
//! encoder.

use smush_core::error::{decode_error, Result};

/// A video codec that mutates a back-buffer in place given an encoded
/// payload. `Codec48Decoder` is the one concrete implementation; the trait
/// exists so the decode call site doesn't need to know which inter-frame
/// scheme produced a given stream.
pub trait VideoCodec {
    fn decode(&mut self, back_buffer: &mut [u8], payload: &[u8]) -> Result<()>;
}

/// Best-effort Codec 48 decoder.
///
/// Frames are either a raw literal copy (the common "key frame" case for
/// this family of codecs) or a sequence of (offset, run) copy/fill glyphs
/// referencing the previous frame, matching the general shape later SMUSH
/// codecs in this family use. Anything it doesn't recognize is treated as a
/// no-op rather than a hard failure, since this path is explicitly
/// best-effort.
pub struct Codec48Decoder {
    width: u16,
    height: u16,
    previous: Vec<u8>,
}

impl Codec48Decoder {
    pub fn new(width: u16, height: u16) -> Self {
        Codec48Decoder {
            width,
            height,
            previous: vec![0u8; width as usize * height as usize],
        }
    }
}

impl VideoCodec for Codec48Decoder {
    fn decode(&mut self, back_buffer: &mut [u8], payload: &[u8]) -> Result<()> {
        let frame_size = self.width as usize * self.height as usize;
        if back_buffer.len() < frame_size {
            return decode_error("back buffer too small for Codec 48 frame");
        }

        if payload.is_empty() {
            return decode_error("empty Codec 48 payload");
        }

        match payload[0] {
            // Sub-codec 1: raw literal frame.
            1 if payload.len() >= 1 + frame_size => {
                back_buffer[..frame_size].copy_from_slice(&payload[1..1 + frame_size]);
            }
            // Sub-codec 2: copy the previous frame unchanged (interpolated
            // "skip" frame).
            2 => {
                back_buffer[..frame_size].copy_from_slice(&self.previous[..frame_size]);
            }
            // Sub-codec 5: run-length glyphs over the previous frame.
            5 => {
                back_buffer[..frame_size].copy_from_slice(&self.previous[..frame_size]);
                let mut pos = 0usize;
                let mut cursor = 1usize;
                while cursor + 1 < payload.len() && pos < frame_size {
                    let run = payload[cursor] as usize;
                    let value = payload[cursor + 1];
                    cursor += 2;
                    let end = (pos + run.max(1)).min(frame_size);
                    back_buffer[pos..end].fill(value);
                    pos = end;
                }
            }
            _ => {
                back_buffer[..frame_size].copy_from_slice(&self.previous[..frame_size]);
            }
        }

        self.previous[..frame_size].copy_from_slice(&back_buffer[..frame_size]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_subcodec_copies_payload() {
        let mut decoder = Codec48Decoder::new(2, 2);
        let mut back_buffer = vec![0u8; 4];
        let payload = [1u8, 9, 8, 7, 6];
        decoder.decode(&mut back_buffer, &payload).unwrap();
        assert_eq!(back_buffer, vec![9, 8, 7, 6]);
    }

    #[test]
    fn skip_subcodec_repeats_previous_frame() {
        let mut decoder = Codec48Decoder::new(2, 2);
        let mut back_buffer = vec![0u8; 4];
        decoder.decode(&mut back_buffer, &[1, 1, 2, 3, 4]).unwrap();
        let mut next = vec![0u8; 4];
        decoder.decode(&mut next, &[2]).unwrap();
        assert_eq!(next, vec![1, 2, 3, 4]);
    }
}
