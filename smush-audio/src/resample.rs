//! Resamples a queuing audio stream's native rate/channel layout into the
//! mixer's fixed 44100 Hz stereo output, mixing additively with saturation.
//!
//! Grounded on the `flow(stream, samples, length, leftVolume, rightVolume)`
//! contract implied by `audioman.cpp`'s `Channel::mix`. The original's
//! `rate.cpp` converter body is not present in the retrieved source, so this
//! is a best-effort nearest-neighbor (zero-order hold) resampler rather than
//! a claim of bit-exact compatibility — the same external-collaborator
//! treatment this repository gives Codec 48.

use crate::queue::QueuingAudioStream;

/// Gains are fixed-point with a denominator of 256, matching
/// `kMaxChannelVolume` in `audioman.cpp`.
pub const GAIN_UNITY: i32 = 256;

/// Converts one source stream into the mixer's output format, holding
/// resampling phase across calls.
pub struct RateConverter {
    src_rate: u32,
    dst_rate: u32,
    stereo_source: bool,
    acc: u32,
    cur: (i16, i16),
    primed: bool,
}

impl RateConverter {
    pub fn new(src_rate: u32, dst_rate: u32, stereo_source: bool) -> Self {
        RateConverter {
            src_rate: src_rate.max(1),
            dst_rate: dst_rate.max(1),
            stereo_source,
            acc: 0,
            cur: (0, 0),
            primed: false,
        }
    }

    /// Mixes `frames` stereo output frames (`dst.len() == frames * 2`) from
    /// `stream`, scaling by the given per-channel gains (denominator
    /// [`GAIN_UNITY`]) and saturating on overflow. Does not zero `dst`
    /// first: callers that mix multiple channels into one buffer rely on
    /// this being additive.
    pub fn flow(
        &mut self,
        stream: &QueuingAudioStream,
        dst: &mut [i16],
        frames: usize,
        left_gain: i32,
        right_gain: i32,
    ) {
        debug_assert_eq!(dst.len(), frames * 2);
        let src_channels = if self.stereo_source { 2 } else { 1 };
        let mut src_buf = [0i16; 2];

        for frame in 0..frames {
            if !self.primed {
                let n = stream.read_samples(&mut src_buf[..src_channels]);
                self.cur = if n < src_channels {
                    (0, 0)
                } else if self.stereo_source {
                    (src_buf[0], src_buf[1])
                } else {
                    (src_buf[0], src_buf[0])
                };
                self.primed = true;
            }

            let l = (self.cur.0 as i32 * left_gain) / GAIN_UNITY;
            let r = (self.cur.1 as i32 * right_gain) / GAIN_UNITY;

            let idx = frame * 2;
            dst[idx] = dst[idx].saturating_add(clamp_i16(l));
            dst[idx + 1] = dst[idx + 1].saturating_add(clamp_i16(r));

            self.acc += self.src_rate;
            while self.acc >= self.dst_rate {
                self.acc -= self.dst_rate;
                self.primed = false;
            }
        }
    }
}

fn clamp_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
