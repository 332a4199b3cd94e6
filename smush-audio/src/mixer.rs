//! The audio mixer: owns all active channels and synchronously fills an
//! output buffer on demand.
//!
//! Grounded almost verbatim on `audioman.cpp`'s `AudioManager`: a
//! critical-section-guarded channel map (here a `Mutex`), a channel-id seed
//! counter reserving `0xFFFFFFFF` as a null handle with rollover-skip, and
//! the exact `updateChannelVolumes` gain formula.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::warn;

use crate::queue::QueuingAudioStream;
use crate::resample::RateConverter;

/// `kMaxAudioManVolume` in the original: the caller-facing volume range is
/// `0..=255`; gains are divided down by this after scaling.
const MAX_VOLUME: i32 = 255;
/// `kMaxChannelVolume`: the internal fixed-point gain scale a raw `volume`
/// byte is multiplied up by before dividing back down by `MAX_VOLUME`.
const MAX_AMPLITUDE: i32 = 256;

/// The reserved "no channel" sentinel, matching the original's
/// `0xFFFFFFFF`. Produced only by [`AudioMixer::null_handle`]; ordinary
/// `play` calls never return it.
pub const NULL_HANDLE: ChannelHandle = ChannelHandle(0xFFFF_FFFF);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(u32);

impl ChannelHandle {
    pub fn is_null(&self) -> bool {
        *self == NULL_HANDLE
    }
}

struct Channel {
    stream: Arc<QueuingAudioStream>,
    converter: RateConverter,
    volume: u8,
    balance: i8,
    left_gain: i32,
    right_gain: i32,
}

impl Channel {
    fn new(stream: Arc<QueuingAudioStream>, dst_rate: u32, volume: u8, balance: i8) -> Self {
        let balance = balance.clamp(-127, 127);
        let converter =
            RateConverter::new(stream.rate(), dst_rate, stream.channels() == 2);
        let mut channel = Channel {
            stream,
            converter,
            volume,
            balance,
            left_gain: 0,
            right_gain: 0,
        };
        channel.update_volumes();
        channel
    }

    fn update_volumes(&mut self) {
        let vol = MAX_AMPLITUDE * self.volume as i32;
        let balance = self.balance as i32;
        if balance == 0 {
            self.left_gain = vol / MAX_VOLUME;
            self.right_gain = vol / MAX_VOLUME;
        } else if balance < 0 {
            self.left_gain = vol / MAX_VOLUME;
            self.right_gain = ((127 + balance) * vol) / (MAX_VOLUME * 127);
        } else {
            self.left_gain = ((127 - balance) * vol) / (MAX_VOLUME * 127);
            self.right_gain = vol / MAX_VOLUME;
        }
    }
}

struct MixerState {
    channels: HashMap<u32, Channel>,
    seed: u32,
}

/// The mixer. Output format is fixed at 44100 Hz stereo 16-bit, matching the
/// original's hard-coded `SDL_AudioSpec`.
pub struct AudioMixer {
    state: Mutex<MixerState>,
}

pub const OUTPUT_RATE: u32 = 44100;
pub const OUTPUT_CHANNELS: u32 = 2;

impl AudioMixer {
    pub fn new() -> Self {
        AudioMixer {
            state: Mutex::new(MixerState {
                channels: HashMap::new(),
                seed: 0,
            }),
        }
    }

    pub fn null_handle(&self) -> ChannelHandle {
        NULL_HANDLE
    }

    /// Forces the internal id-seed counter, so tests can exercise the
    /// rollover-past-`0xFFFFFFFF` behavior without issuing four billion
    /// `play` calls.
    #[cfg(test)]
    pub(crate) fn set_seed_for_test(&self, seed: u32) {
        self.state.lock().unwrap().seed = seed;
    }

    /// Registers `stream` as a new channel and returns its handle.
    pub fn play(
        &self,
        stream: Arc<QueuingAudioStream>,
        volume: u8,
        balance: i8,
    ) -> ChannelHandle {
        let channel = Channel::new(stream, OUTPUT_RATE, volume, balance);
        let mut state = self.state.lock().unwrap();

        let mut id = state.seed;
        state.seed = state.seed.wrapping_add(1);
        if id == NULL_HANDLE.0 {
            warn!("rolling over audio channel ids");
            id = 0;
            state.seed = 1;
        }

        state.channels.insert(id, channel);
        ChannelHandle(id)
    }

    pub fn stop(&self, handle: ChannelHandle) {
        if handle.is_null() {
            return;
        }
        self.state.lock().unwrap().channels.remove(&handle.0);
    }

    pub fn stop_all(&self) {
        self.state.lock().unwrap().channels.clear();
    }

    pub fn set_volume(&self, handle: ChannelHandle, volume: u8) {
        if handle.is_null() {
            return;
        }
        let mut state = self.state.lock().unwrap();
        if let Some(channel) = state.channels.get_mut(&handle.0) {
            channel.volume = volume;
            channel.update_volumes();
        }
    }

    pub fn get_volume(&self, handle: ChannelHandle) -> u8 {
        if handle.is_null() {
            return 0;
        }
        self.state
            .lock()
            .unwrap()
            .channels
            .get(&handle.0)
            .map(|c| c.volume)
            .unwrap_or(0)
    }

    /// Fills `dst` (interleaved stereo `i16` samples) with mixed audio.
    /// `dst.len()` must be even (a whole number of stereo frames). The
    /// buffer is zeroed first, then every non-end-of-stream channel mixes in
    /// additively; channels that are momentarily out of data (but not yet
    /// finished) contribute silence without being removed.
    pub fn fill(&self, dst: &mut [i16]) {
        debug_assert_eq!(dst.len() % 2, 0);
        dst.fill(0);
        let frames = dst.len() / 2;

        let mut state = self.state.lock().unwrap();
        for channel in state.channels.values_mut() {
            if channel.stream.end_of_stream() {
                // TODO: remove the channel once a "channel finished" callback exists.
                continue;
            }
            if channel.stream.end_of_data() {
                continue;
            }
            channel
                .converter
                .flow(&channel.stream, dst, frames, channel.left_gain, channel.right_gain);
        }
    }
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::new()
    }
}
