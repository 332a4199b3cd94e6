//! IACT audio extraction, the queuing audio stream, the resampling mixer,
//! and the (currently unpopulated) non-IACT audio track ordering.
//!
//! Module layout mirrors `symphonia-codec-adpcm`: small per-concern modules,
//! crate-level lints matching the workspace's clippy allow-list.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod iact;
pub mod mixer;
pub mod queue;
pub mod resample;
pub mod track;

pub use iact::IactDecoder;
pub use mixer::{AudioMixer, ChannelHandle};
pub use queue::QueuingAudioStream;
pub use track::{TrackHandle, TrackKind};
