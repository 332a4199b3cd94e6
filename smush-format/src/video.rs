//! Palette state and the paletted video pipeline: codec 1/3 run-length
//! decode, delta-palette application, and the store/fetch snapshot cache.
//!
//! Grounded on `smushvideo.cpp`'s `handleNewPalette`, `handleDeltaPalette`,
//! `handleFrameObject`, `decodeCodec1`, `handleStore`, and `handleFetch`.

use log::warn;
use smush_core::error::Result;
use smush_core::io::ReadBytes;

use crate::codec48::Codec48Decoder;
use crate::container::{ContainerKind, Header};

/// The 768-entry RGB palette plus its signed delta, used by ANIM only.
#[derive(Debug, Clone)]
pub struct Palette {
    pub rgb: [u8; 768],
    pub delta: [i16; 768],
}

impl Palette {
    pub fn new(initial: [u8; 768]) -> Self {
        Palette {
            rgb: initial,
            delta: [0; 768],
        }
    }

    /// `NPAL`: load a full 768-byte palette. An undersized chunk is a
    /// recoverable anomaly: logged and absorbed, palette left unchanged.
    pub fn load_full<R: ReadBytes>(&mut self, reader: &mut R, size: u32) -> Result<()> {
        if size < 768 {
            warn!("NPAL: chunk of {size} bytes is too small, ignoring");
            return Ok(());
        }
        reader.read_buf_exact(&mut self.rgb)?;
        Ok(())
    }

    /// `XPAL`: either load a new delta (and possibly base) palette, or apply
    /// the previously stored delta to the current palette.
    ///
    /// `payload_len` is the declared chunk size, used to disambiguate the
    /// four known variants. An unrecognized size is a recoverable anomaly:
    /// logged and absorbed, palette left unchanged.
    pub fn apply_xpal<R: ReadBytes>(&mut self, reader: &mut R, payload_len: u32) -> Result<()> {
        match payload_len {
            2308 => {
                reader.ignore_bytes(4)?;
                for d in self.delta.iter_mut() {
                    *d = reader.read_i16_le()?;
                }
                reader.read_buf_exact(&mut self.rgb)?;
            }
            1540 => {
                reader.ignore_bytes(4)?;
                for d in self.delta.iter_mut() {
                    *d = reader.read_i16_le()?;
                }
            }
            6 | 4 => {
                for i in 0..768 {
                    let v = (self.rgb[i] as i32) * 129 + self.delta[i] as i32;
                    self.rgb[i] = (v / 128).clamp(0, 255) as u8;
                }
            }
            other => {
                warn!("XPAL: chunk size {other} does not match a known variant, ignoring");
            }
        }
        Ok(())
    }
}

/// Header fields of an `FOBJ` sub-chunk.
#[derive(Debug, Clone, Copy)]
struct FobjHeader {
    codec: u8,
    left: i16,
    top: i16,
    width: u16,
    height: u16,
}

fn read_fobj_header<R: ReadBytes>(reader: &mut R) -> Result<FobjHeader> {
    let codec = reader.read_byte()?;
    let _codec_param = reader.read_byte()?;
    let left = reader.read_i16_le()?;
    let top = reader.read_i16_le()?;
    let width = reader.read_u16_le()?;
    let height = reader.read_u16_le()?;
    let _unused0 = reader.read_u16_le()?;
    let _unused1 = reader.read_u16_le()?;
    Ok(FobjHeader {
        codec,
        left,
        top,
        width,
        height,
    })
}

/// Owns the decoded back-buffer, palette, stored-frame cache, and the
/// Codec 48 decoder instance for one video.
pub struct VideoState {
    pub width: u16,
    pub height: u16,
    pub pitch: usize,
    pub back_buffer: Vec<u8>,
    pub palette: Option<Palette>,
    stored_frame: Option<Vec<u8>>,
    store_pending: bool,
    codec48: Option<Codec48Decoder>,
    is_anim: bool,
}

impl VideoState {
    pub fn new(header: &Header) -> Self {
        let pitch = header.pitch();
        let is_anim = matches!(header.kind, ContainerKind::Anim { .. });
        VideoState {
            width: header.width,
            height: header.height,
            pitch,
            back_buffer: vec![0u8; pitch * header.height as usize],
            palette: is_anim.then(|| Palette::new(header.initial_palette)),
            stored_frame: None,
            store_pending: false,
            codec48: None,
            is_anim,
        }
    }

    /// `STOR`: request that the next `FOBJ`'s decoded result be captured.
    pub fn request_store(&mut self) {
        self.store_pending = true;
    }

    /// `FOBJ`: decode one frame object into the back-buffer.
    pub fn decode_fobj<R: ReadBytes>(&mut self, reader: &mut R, size: u32) -> Result<()> {
        let start = reader.pos();
        let hdr = read_fobj_header(reader)?;

        let geometry_ok = if matches!(hdr.codec, 37 | 47 | 48) {
            hdr.width == self.width && hdr.height == self.height
        } else {
            let left = hdr.left.max(0) as i64;
            let top = hdr.top.max(0) as i64;
            left + hdr.width as i64 <= self.width as i64
                && top + hdr.height as i64 <= self.height as i64
                && hdr.left >= 0
                && hdr.top >= 0
        };

        if !geometry_ok {
            warn!(
                "FOBJ: codec {} rectangle ({},{},{},{}) does not fit frame, skipping",
                hdr.codec, hdr.left, hdr.top, hdr.width, hdr.height
            );
            reader.seek_to(start + size as u64)?;
            return Ok(());
        }

        match hdr.codec {
            1 | 3 => self.decode_codec1(reader, &hdr)?,
            48 => {
                let payload_len = size as usize - 14;
                let payload = reader.read_boxed_slice(payload_len)?;
                let decoder = self
                    .codec48
                    .get_or_insert_with(|| Codec48Decoder::new(self.width, self.height));
                decoder.decode(&mut self.back_buffer, &payload)?;
            }
            other => {
                warn!("FOBJ: unsupported codec {other}, skipping payload");
            }
        }

        reader.seek_to(start + size as u64)?;

        if self.store_pending {
            self.stored_frame = Some(self.back_buffer.clone());
            self.store_pending = false;
        }

        Ok(())
    }

    fn decode_codec1<R: ReadBytes>(&mut self, reader: &mut R, hdr: &FobjHeader) -> Result<()> {
        let pitch = self.pitch;
        let left = hdr.left as usize;
        let top = hdr.top as usize;

        for row in 0..hdr.height as usize {
            let mut line_size = reader.read_u16_le()? as i32;
            let mut x = 0usize;
            let dst_row_start = (top + row) * pitch + left;

            while line_size > 0 {
                let code = reader.read_byte()?;
                line_size -= 1;
                let length = ((code >> 1) as usize) + 1;

                if code & 1 != 0 {
                    let val = reader.read_byte()?;
                    line_size -= 1;
                    if val != 0 {
                        for i in 0..length {
                            self.back_buffer[dst_row_start + x + i] = val;
                        }
                    }
                    x += length;
                } else {
                    for i in 0..length {
                        let val = reader.read_byte()?;
                        line_size -= 1;
                        if val != 0 {
                            self.back_buffer[dst_row_start + x + i] = val;
                        }
                    }
                    x += length;
                }
            }
        }
        Ok(())
    }

    /// `FTCH`: restore (optionally translated) pixels from the stored frame.
    pub fn fetch<R: ReadBytes>(&mut self, reader: &mut R, size: u32) -> Result<()> {
        let start = reader.pos();
        let _index = if size >= 4 { reader.read_i32_be()? } else { 0 };
        let dx = if size >= 8 { reader.read_i32_be()? } else { 0 };
        let dy = if size >= 12 { reader.read_i32_be()? } else { 0 };
        reader.seek_to(start + size as u64)?;

        let Some(stored) = self.stored_frame.clone() else {
            return Ok(());
        };
        let pitch = self.pitch;
        let (width, height) = (self.width as i64, self.height as i64);

        for y in 0..height {
            for x in 0..width {
                let (dst_x, dst_y) = (x + dx as i64, y + dy as i64);
                if dst_x < 0 || dst_y < 0 || dst_x >= width || dst_y >= height {
                    continue;
                }
                let src_idx = (y as usize) * pitch + x as usize;
                let dst_idx = (dst_y as usize) * pitch + dst_x as usize;
                self.back_buffer[dst_idx] = stored[src_idx];
            }
        }
        Ok(())
    }

    pub fn is_anim(&self) -> bool {
        self.is_anim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ContainerKind, Header};
    use smush_core::io::BufReader;

    fn test_header(width: u16, height: u16) -> Header {
        Header {
            kind: ContainerKind::Anim { version: 2 },
            frame_count: 1,
            width,
            height,
            frame_rate: 15,
            audio_rate: 22050,
            audio_channels: 1,
            initial_palette: [0u8; 768],
        }
    }

    #[test]
    fn delta_palette_clamp_matches_formula() {
        let mut pal = Palette::new([10u8; 768]);
        pal.delta = [500i16; 768];
        let data: [u8; 0] = [];
        let mut r = BufReader::new(&data);
        pal.apply_xpal(&mut r, 6).unwrap();
        let expected = (((10i32 * 129) + 500) / 128).clamp(0, 255) as u8;
        assert_eq!(pal.rgb[0], expected);
    }

    #[test]
    fn codec1_run_of_nonzero_writes_value() {
        let mut state = VideoState::new(&test_header(4, 1));
        // FOBJ header (14 bytes): codec=1, param=0, left=0, top=0, w=4, h=1, 0,0
        let mut payload = Vec::new();
        payload.push(1);
        payload.push(0);
        payload.extend_from_slice(&0i16.to_le_bytes());
        payload.extend_from_slice(&0i16.to_le_bytes());
        payload.extend_from_slice(&4u16.to_le_bytes());
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        // row: line_size, then one run-of-4 code=(length-1)<<1|1 -> length 4 => code=6, val=7
        payload.extend_from_slice(&2u16.to_le_bytes()); // line_size = 2 bytes (code+val)
        payload.push(6); // code: (4-1)<<1 | 1 = 7? let's recompute: length=(code>>1)+1
        // we want length=4 -> code>>1=3 -> code=6 or 7 (odd bit for run flag)
        // code&1=1 means run; code=7 -> code>>1=3 -> length=4. fix:
        payload.pop();
        payload.push(7);
        payload.push(9); // val = 9

        let mut r = BufReader::new(&payload);
        state.decode_fobj(&mut r, payload.len() as u32).unwrap();
        assert_eq!(&state.back_buffer[0..4], &[9, 9, 9, 9]);
    }

    #[test]
    fn store_then_fetch_zero_offset_restores_identical_buffer() {
        let mut state = VideoState::new(&test_header(2, 2));
        state.back_buffer = vec![1, 2, 3, 4];
        state.request_store();

        // A trivial FOBJ with geometry matching the whole frame, codec 1,
        // run writing nothing (all zero transparency) so back_buffer stays.
        let mut payload = Vec::new();
        payload.push(1);
        payload.push(0);
        payload.extend_from_slice(&0i16.to_le_bytes());
        payload.extend_from_slice(&0i16.to_le_bytes());
        payload.extend_from_slice(&2u16.to_le_bytes());
        payload.extend_from_slice(&2u16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        for _ in 0..2 {
            payload.extend_from_slice(&2u16.to_le_bytes());
            payload.push(1); // code -> length=1, run
            payload.push(0); // val=0, transparent: no write
        }
        let mut r = BufReader::new(&payload);
        state.decode_fobj(&mut r, payload.len() as u32).unwrap();
        assert_eq!(state.back_buffer, vec![1, 2, 3, 4]);

        let fetch_payload = [0u8; 12]; // index=0, dx=0, dy=0
        let mut r2 = BufReader::new(&fetch_payload);
        state.fetch(&mut r2, fetch_payload.len() as u32).unwrap();
        assert_eq!(state.back_buffer, vec![1, 2, 3, 4]);
    }
}
