//! Container parsing and paletted video pipeline for LucasArts SMUSH files
//! (`ANIM` v1/v2 and `SANM`).
//!
//! Laid out the way `symphonia-format-riff` is: a tag module, a generic
//! chunk-skip helper, and a per-format container/decode module.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod bitmap;
pub mod chunks;
pub mod clock;
pub mod codec48;
pub mod container;
pub mod tag;
pub mod video;

pub use clock::{Clock, FrameStatus, SystemTickSource, TickSource};
pub use container::{ContainerKind, Header, LoadOptions};
pub use tag::FourCc;
pub use video::VideoState;
