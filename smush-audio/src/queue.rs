//! A FIFO of owned PCM buffers presented as a single logical audio source.
//!
//! Grounded on the `AudioStream` implied by `audioman.cpp`'s `Channel`
//! (`getRate`/`getChannels`/`endOfStream`/`endOfData`). Appended to from the
//! video-decode side and drained from the mixer side, so it carries its own
//! internal mutex per `SPEC_FULL.md` §5's "must provide its own internal
//! mutual exclusion" requirement.

use std::collections::VecDeque;
use std::sync::Mutex;

struct Inner {
    buffers: VecDeque<Vec<i16>>,
    cursor: usize,
    finished: bool,
}

/// A thread-safe queue of interleaved PCM sample buffers.
pub struct QueuingAudioStream {
    rate: u32,
    channels: u32,
    inner: Mutex<Inner>,
}

impl QueuingAudioStream {
    pub fn new(rate: u32, channels: u32) -> Self {
        QueuingAudioStream {
            rate,
            channels,
            inner: Mutex::new(Inner {
                buffers: VecDeque::new(),
                cursor: 0,
                finished: false,
            }),
        }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Appends a buffer of interleaved samples, e.g. a decoded IACT packet.
    pub fn queue_buffer(&self, samples: Vec<i16>) {
        let mut inner = self.inner.lock().unwrap();
        inner.buffers.push_back(samples);
    }

    /// Marks the stream as having no further buffers to come. Once drained,
    /// `end_of_stream` becomes true.
    pub fn finish(&self) {
        self.inner.lock().unwrap().finished = true;
    }

    /// True once finished and every queued sample has been drained.
    pub fn end_of_stream(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.finished && inner.buffers.is_empty()
    }

    /// True when there is momentarily nothing to play, but more may arrive
    /// (i.e. not finished).
    pub fn end_of_data(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.buffers.is_empty() && !inner.finished
    }

    /// Pulls up to `dest.len()` samples, draining across buffer boundaries.
    /// Returns the number of samples written.
    pub fn read_samples(&self, dest: &mut [i16]) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let mut written = 0;

        while written < dest.len() {
            let Some(front) = inner.buffers.front() else {
                break;
            };
            let available = front.len() - inner.cursor;
            let want = dest.len() - written;
            let take = available.min(want);

            dest[written..written + take]
                .copy_from_slice(&front[inner.cursor..inner.cursor + take]);
            written += take;
            inner.cursor += take;

            if inner.cursor >= front.len() {
                inner.buffers.pop_front();
                inner.cursor = 0;
            }
        }

        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_across_buffer_boundaries() {
        let stream = QueuingAudioStream::new(22050, 2);
        stream.queue_buffer(vec![1, 2, 3]);
        stream.queue_buffer(vec![4, 5]);
        stream.finish();

        let mut out = [0i16; 4];
        let n = stream.read_samples(&mut out);
        assert_eq!(n, 4);
        assert_eq!(out, [1, 2, 3, 4]);
        assert!(!stream.end_of_stream());

        let mut out2 = [0i16; 4];
        let n2 = stream.read_samples(&mut out2);
        assert_eq!(n2, 1);
        assert_eq!(out2[0], 5);
        assert!(stream.end_of_stream());
    }

    #[test]
    fn end_of_data_without_finish_is_not_end_of_stream() {
        let stream = QueuingAudioStream::new(22050, 2);
        assert!(stream.end_of_data());
        assert!(!stream.end_of_stream());
    }
}
