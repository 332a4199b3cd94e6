//! Tick-based frame pacing.
//!
//! Grounded on `smushvideo.cpp`'s `frame()` gating logic. `TickSource` is the
//! one ambient seam this port adds that the original's raw `GetTicks()` call
//! didn't need: a narrow trait at the time-source boundary, in the spirit of
//! `symphonia_core::io::MediaSource` being a narrow trait at the byte-source
//! boundary.

use std::time::Instant;

use crate::container::{ContainerKind, Header};

/// A source of monotonically increasing millisecond ticks.
pub trait TickSource {
    fn now_ms(&self) -> u64;
}

/// The production [`TickSource`], backed by [`std::time::Instant`].
pub struct SystemTickSource {
    epoch: Instant,
}

impl SystemTickSource {
    pub fn new() -> Self {
        SystemTickSource {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemTickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SystemTickSource {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Result of advancing the clock by one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    NoNewFrame = 0,
    NewFrame = 1,
    Done = 2,
}

/// Gates frame advancement against a [`TickSource`], honoring the
/// version-specific frame-rate unit (ANIM: fps; SANM: µs/frame).
pub struct Clock {
    frame_count: u32,
    cur_frame: u32,
    frame_rate: u32,
    is_sanm: bool,
    last_frame_tick: Option<u64>,
}

impl Clock {
    pub fn new(header: &Header) -> Self {
        Clock {
            frame_count: header.frame_count,
            cur_frame: 0,
            frame_rate: header.frame_rate,
            is_sanm: matches!(header.kind, ContainerKind::Sanm),
            last_frame_tick: None,
        }
    }

    fn next_time_ms(&self, frame: u32) -> u64 {
        if self.is_sanm {
            (frame as u64) * (self.frame_rate as u64) / 1000
        } else {
            (frame as u64) * 1000 / (self.frame_rate.max(1) as u64)
        }
    }

    pub fn cur_frame(&self) -> u32 {
        self.cur_frame
    }

    /// Decides whether a new frame is due. Returns [`FrameStatus::NewFrame`]
    /// at most once per call, advancing `cur_frame` when it does; the caller
    /// is responsible for actually decoding the `FRME` in that case.
    pub fn tick<T: TickSource>(&mut self, ticks: &T) -> FrameStatus {
        let now = ticks.now_ms();
        let last = *self.last_frame_tick.get_or_insert(now);

        if self.cur_frame >= self.frame_count {
            return FrameStatus::Done;
        }

        let elapsed = now.saturating_sub(last);
        if elapsed <= self.next_time_ms(self.cur_frame) {
            return FrameStatus::NoNewFrame;
        }

        self.cur_frame += 1;
        FrameStatus::NewFrame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerKind;
    use std::cell::Cell;

    struct FakeTicks(Cell<u64>);
    impl TickSource for FakeTicks {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    fn anim_header(frame_count: u32, frame_rate: u32) -> Header {
        Header {
            kind: ContainerKind::Anim { version: 2 },
            frame_count,
            width: 4,
            height: 4,
            frame_rate,
            audio_rate: 22050,
            audio_channels: 1,
            initial_palette: [0u8; 768],
        }
    }

    #[test]
    fn emits_new_frame_then_done() {
        let header = anim_header(2, 10); // 100ms/frame
        let mut clock = Clock::new(&header);
        let ticks = FakeTicks(Cell::new(0));

        assert_eq!(clock.tick(&ticks), FrameStatus::NoNewFrame);
        ticks.0.set(150);
        assert_eq!(clock.tick(&ticks), FrameStatus::NewFrame);
        ticks.0.set(260);
        assert_eq!(clock.tick(&ticks), FrameStatus::NewFrame);
        ticks.0.set(400);
        assert_eq!(clock.tick(&ticks), FrameStatus::Done);
    }

    #[test]
    fn sanm_frame_rate_is_microseconds() {
        let mut header = anim_header(1, 0);
        header.kind = ContainerKind::Sanm;
        header.frame_rate = 66_667; // ~15fps in microseconds
        let mut clock = Clock::new(&header);
        let ticks = FakeTicks(Cell::new(0));
        assert_eq!(clock.tick(&ticks), FrameStatus::NoNewFrame);
        ticks.0.set(100);
        assert_eq!(clock.tick(&ticks), FrameStatus::NewFrame);
    }
}
