//! Host-facing API for decoding LucasArts SMUSH `ANIM`/`SANM` files.
//!
//! `Video` ties the container parser, paletted video pipeline, audio
//! mixer, playback clock, and bitmap exporter together, in the shape of
//! `symphonia_format_riff::wave::WavReader`: one top-level struct composing
//! a reader with format/decode state. Its public surface (`load`/`info`/
//! `frame`/`get_frame`/`get_audio`/`cutscene_string_id`/`close`) mirrors
//! `smushvideo.cpp`'s `SMUSHVideo` class.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use log::debug;

use smush_audio::iact::{IactDecoder, IACT_CHANNELS, IACT_SAMPLE_RATE};
use smush_audio::mixer::{AudioMixer, ChannelHandle};
use smush_audio::queue::QueuingAudioStream;
use smush_core::error::{decode_error, Result};
use smush_core::io::{BufReader, ReadBytes};
use smush_format::bitmap::export_rgb24;
use smush_format::chunks::{ChunkHeader, ChunksReader};
use smush_format::clock::{Clock, FrameStatus, TickSource};
use smush_format::container::{load_header, Header, LoadOptions};
use smush_format::tag;
use smush_format::video::VideoState;

pub use smush_format::clock::SystemTickSource;
pub use smush_format::container::ContainerKind;

/// Read-only summary of a loaded video, exposed via [`Video::info`].
#[derive(Debug, Clone, Copy)]
pub struct VideoInfo {
    pub width: u16,
    pub height: u16,
    pub frame_count: u32,
    /// ANIM: integer frames per second. SANM: derived from µs/frame.
    pub fps: f64,
}

/// A loaded SMUSH video. Owns the byte reader, video pipeline state, and a
/// reference to its audio mixer; exposed as inherent methods rather than an
/// `extern "C"` ABI, since the host embedding layer is out of scope here.
pub struct Video<'a> {
    reader: BufReader<'a>,
    header: Header,
    state: VideoState,
    clock: Clock,
    mixer: Arc<AudioMixer>,
    iact_decoder: Option<IactDecoder>,
    iact_stream: Option<Arc<QueuingAudioStream>>,
    iact_handle: Option<ChannelHandle>,
    iact_has_sound: Option<bool>,
    cutscene_string_id: u16,
    closed: bool,
}

impl<'a> Video<'a> {
    /// Parses the outer header and allocates all decode state. Does not
    /// decode any frames yet.
    pub fn load(buffer: &'a [u8], opts: LoadOptions) -> Result<Self> {
        let mut reader = BufReader::new(buffer);
        let header = load_header(&mut reader, opts)?;
        let state = VideoState::new(&header);
        let clock = Clock::new(&header);

        Ok(Video {
            reader,
            header,
            state,
            clock,
            mixer: Arc::new(AudioMixer::new()),
            iact_decoder: None,
            iact_stream: None,
            iact_handle: None,
            iact_has_sound: None,
            cutscene_string_id: 0,
            closed: false,
        })
    }

    pub fn info(&self) -> VideoInfo {
        VideoInfo {
            width: self.header.width,
            height: self.header.height,
            frame_count: self.header.frame_count,
            fps: self.header.fps(),
        }
    }

    /// Most recently seen `TRES` string id, or 0 if none has been seen yet.
    pub fn cutscene_string_id(&self) -> u16 {
        self.cutscene_string_id
    }

    /// Shared handle to this video's audio mixer, e.g. for wiring up a host
    /// audio callback.
    pub fn mixer(&self) -> Arc<AudioMixer> {
        self.mixer.clone()
    }

    /// Advances playback against `ticks`, decoding at most one `FRME` per
    /// call.
    pub fn frame<T: TickSource>(&mut self, ticks: &T) -> Result<FrameStatus> {
        if self.closed {
            return Ok(FrameStatus::Done);
        }
        let status = self.clock.tick(ticks);
        if status == FrameStatus::NewFrame {
            self.dispatch_frame()?;
        }
        Ok(status)
    }

    /// Exports the current back-buffer as RGB24 into `dest`, `stride` bytes
    /// per row, BGR byte order within each pixel.
    pub fn get_frame(&self, dest: &mut [u8], stride: usize) {
        export_rgb24(&self.state, self.state.palette.as_ref(), dest, stride);
    }

    /// Drives the mixer to fill `dest` with interleaved 44100 Hz stereo
    /// `i16` PCM. `dest.len()` must be even.
    pub fn get_audio(&self, dest: &mut [i16]) {
        self.mixer.fill(dest);
    }

    /// Releases owned resources. Safe to call more than once; always stops
    /// all mixer channels before releasing, matching `SMUSHVideo::close`.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.mixer.stop_all();
        self.closed = true;
    }

    fn dispatch_frame(&mut self) -> Result<()> {
        loop {
            let frame_tag = tag::FourCc::from_u32_be(self.reader.read_u32_be()?);
            let size = self.reader.read_u32_be()?;

            if frame_tag == tag::ANNO {
                self.reader.ignore_bytes(size as u64 + (size & 1) as u64)?;
                continue;
            }
            if frame_tag != tag::FRME {
                return decode_error("expected FRME chunk");
            }
            return self.dispatch_frme_body(size);
        }
    }

    fn dispatch_frme_body(&mut self, size: u32) -> Result<()> {
        let mut chunks = ChunksReader::new(&self.reader, size as u64);
        while let Some(sub) = chunks.next(&mut self.reader)? {
            self.dispatch_sub_chunk(&sub)?;
            chunks.skip_to_next(&mut self.reader, &sub)?;
        }
        Ok(())
    }

    fn dispatch_sub_chunk(&mut self, sub: &ChunkHeader) -> Result<()> {
        if sub.tag == tag::FOBJ {
            self.state.decode_fobj(&mut self.reader, sub.size)?;
        } else if sub.tag == tag::FTCH {
            self.state.fetch(&mut self.reader, sub.size)?;
        } else if sub.tag == tag::STOR {
            self.state.request_store();
        } else if sub.tag == tag::NPAL {
            if let Some(pal) = self.state.palette.as_mut() {
                pal.load_full(&mut self.reader, sub.size)?;
            }
        } else if sub.tag == tag::XPAL {
            if let Some(pal) = self.state.palette.as_mut() {
                pal.apply_xpal(&mut self.reader, sub.size)?;
            }
        } else if sub.tag == tag::TRES {
            // Shares a 16-byte common header with TEXT (pos_x, pos_y,
            // flags, left, top, right, height, unk2); the string id follows
            // it rather than leading the payload.
            if sub.size >= 18 {
                self.reader.ignore_bytes(16)?;
                self.cutscene_string_id = self.reader.read_u16_le()?;
            }
        } else if sub.tag == tag::TEXT {
            // Captured but not rendered by this core.
        } else if sub.tag == tag::IACT {
            self.handle_iact(sub)?;
        } else {
            debug!("FRME: ignoring unrecognized sub-chunk {}", sub.tag);
        }
        Ok(())
    }

    fn handle_iact(&mut self, sub: &ChunkHeader) -> Result<()> {
        if sub.size < 8 {
            return Ok(());
        }
        let code = self.reader.read_u16_le()?;
        let flags = self.reader.read_u16_le()?;
        let _unused = self.reader.read_i16_le()?;
        let track_flags = self.reader.read_u16_le()?;
        let mut remaining = sub.size - 8;

        if code == 6 && flags == 38 {
            // Frame-clear hint: intentionally a no-op, see DESIGN.md.
            return Ok(());
        }
        if code != 8 || flags != 46 {
            // INSANE scripting command data, not audio.
            return Ok(());
        }

        let has_sound = *self.iact_has_sound.get_or_insert(track_flags == 0);
        if !has_sound || track_flags != 0 {
            return Ok(());
        }

        if self.iact_stream.is_none() {
            let stream = Arc::new(QueuingAudioStream::new(IACT_SAMPLE_RATE, IACT_CHANNELS));
            let handle = self.mixer.play(stream.clone(), 255, 0);
            self.iact_stream = Some(stream);
            self.iact_handle = Some(handle);
            self.iact_decoder = Some(IactDecoder::new());
        }

        // 18 bytes of per-packet IACT header: trackID, index, frameCount,
        // bytesLeft. Recorded in the original, unused by this core.
        if remaining < 18 {
            return Ok(());
        }
        self.reader.ignore_bytes(18)?;
        remaining -= 18;

        let stream = self.iact_stream.as_ref().unwrap().clone();
        self.iact_decoder
            .as_mut()
            .unwrap()
            .feed(&mut self.reader, remaining, |samples| {
                stream.queue_buffer(samples);
            })?;
        Ok(())
    }
}

impl<'a> Drop for Video<'a> {
    fn drop(&mut self) {
        self.close();
    }
}
