//! IACT packet parsing and 4-bit-shifted delta ADPCM decoding.
//!
//! Grounded on `smushvideo.cpp`'s `handleIACT`/`bufferIACTAudio`: an 18-byte
//! header skip, a streaming `iact_pos` cursor over a 4096-byte scratch
//! buffer, and a decode step that always emits exactly 4096 bytes (1024
//! stereo `i16` samples) at a fixed 22050 Hz.

use smush_core::error::Result;
use smush_core::io::ReadBytes;

const BUFFER_SIZE: usize = 4096;
/// CMI IACT audio is always decoded at this rate, independent of whatever
/// the container header claims — matches the original exactly (see
/// `SPEC_FULL.md` §9, Open Question 1).
pub const IACT_SAMPLE_RATE: u32 = 22050;
pub const IACT_CHANNELS: u32 = 2;

/// Streaming decoder for one IACT audio track's delta-ADPCM packets.
pub struct IactDecoder {
    buffer: [u8; BUFFER_SIZE + 2],
    pos: usize,
}

impl IactDecoder {
    pub fn new() -> Self {
        IactDecoder {
            buffer: [0u8; BUFFER_SIZE + 2],
            pos: 0,
        }
    }

    /// Feeds `size` bytes of the sub-chunk payload (after the 18-byte IACT
    /// header has already been skipped by the caller). Every time a full
    /// packet completes, the decoded 1024 stereo samples are appended via
    /// `emit`.
    pub fn feed<R: ReadBytes>(
        &mut self,
        reader: &mut R,
        mut remaining: u32,
        mut emit: impl FnMut(Vec<i16>),
    ) -> Result<()> {
        while remaining > 0 {
            if self.pos < 2 {
                self.buffer[self.pos] = reader.read_byte()?;
                self.pos += 1;
                remaining -= 1;
                continue;
            }

            let packet_len = u16::from_be_bytes([self.buffer[0], self.buffer[1]]) as usize + 2;
            let need = packet_len - self.pos;

            if need > remaining as usize {
                let take = remaining as usize;
                for i in 0..take {
                    self.buffer[self.pos + i] = reader.read_byte()?;
                }
                self.pos += take;
                remaining = 0;
            } else {
                for i in 0..need {
                    self.buffer[self.pos + i] = reader.read_byte()?;
                }
                self.pos += need;
                remaining -= need as u32;

                let samples = decode_packet(&self.buffer);
                emit(samples);
                self.pos = 0;
            }
        }
        Ok(())
    }
}

impl Default for IactDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes one complete IACT packet (length prefix + shift byte + 2048
/// shifted/literal sample bytes) into exactly 1024 interleaved stereo `i16`
/// samples.
fn decode_packet(buffer: &[u8]) -> Vec<i16> {
    let var = buffer[2];
    let shift_right = var >> 4;
    let shift_left = var & 0x0F;

    let mut src = 3usize;
    let mut out = Vec::with_capacity(2048);

    for _ in 0..1024 {
        for channel in 0..2 {
            let shift = if channel == 0 { shift_right } else { shift_left };
            let value = buffer[src];
            src += 1;

            let sample = if value == 0x80 {
                let hi = buffer[src];
                let lo = buffer[src + 1];
                src += 2;
                i16::from_be_bytes([hi, lo])
            } else {
                (((value as i8) as i32) << shift) as i16
            };
            out.push(sample);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use smush_core::io::BufReader;

    fn build_packet(shift_right: u8, shift_left: u8) -> Vec<u8> {
        let mut payload = vec![0u8; 1 + 2048]; // shift byte + 2048 sample bytes
        payload[0] = (shift_right << 4) | (shift_left & 0x0F);
        // Fill every sample byte with a small literal value (not 0x80).
        for b in payload[1..].iter_mut() {
            *b = 2;
        }
        let packet_len = payload.len() as u16; // excludes the 2-byte length prefix itself
        let mut full = Vec::new();
        full.extend_from_slice(&packet_len.to_be_bytes());
        full.extend_from_slice(&payload);
        full
    }

    #[test]
    fn decodes_exactly_4096_bytes_and_resets_pos() {
        let packet = build_packet(2, 3);
        let mut reader = BufReader::new(&packet);
        let mut decoder = IactDecoder::new();
        let mut emitted = None;
        decoder
            .feed(&mut reader, packet.len() as u32, |samples| {
                emitted = Some(samples);
            })
            .unwrap();

        let samples = emitted.expect("packet should have completed");
        assert_eq!(samples.len(), 2048);
        assert_eq!(decoder.pos, 0);
        // left channel (even indices) shifted by shift_right=2: 2i8 << 2 = 8
        assert_eq!(samples[0], 8);
        // right channel (odd indices) shifted by shift_left=3: 2i8 << 3 = 16
        assert_eq!(samples[1], 16);
    }

    #[test]
    fn splits_across_multiple_feed_calls() {
        let packet = build_packet(1, 1);
        let mut decoder = IactDecoder::new();
        let (first, second) = packet.split_at(10);

        let mut r1 = BufReader::new(first);
        let mut emitted = false;
        decoder
            .feed(&mut r1, first.len() as u32, |_| emitted = true)
            .unwrap();
        assert!(!emitted);

        let mut r2 = BufReader::new(second);
        decoder
            .feed(&mut r2, second.len() as u32, |_| emitted = true)
            .unwrap();
        assert!(emitted);
    }
}
