//! Shared I/O and error primitives used across the `smush-rs` crates.
//!
//! This crate plays the same role `symphonia-core` plays for Symphonia's
//! format/codec crates: a small, dependency-light base that the higher-level
//! crates build on.

pub mod error;
pub mod io;

pub use error::{Result, SmushError};
pub use io::{BufReader, ReadBytes};
