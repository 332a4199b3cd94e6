//! Error type shared by every `smush-rs` crate.
//!
//! Modeled on `symphonia_core::errors::SymphoniaError`: a small non-generic
//! enum, a handful of constructor functions for common cases, and a crate-wide
//! `Result` alias. No `std::error::Error`-deriving macro is used, matching the
//! teacher.

use std::fmt;

/// The error type returned by all fallible operations in `smush-rs`.
#[derive(Debug)]
pub enum SmushError {
    /// An underlying I/O operation failed.
    Io(std::io::Error),
    /// The bit stream is malformed in a way that prevents further decoding.
    Decode(&'static str),
    /// A feature of the container or a dependent feature is not supported.
    Unsupported(&'static str),
    /// The stream ended before the expected data was found.
    Eof,
}

impl fmt::Display for SmushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmushError::Io(err) => write!(f, "io error: {err}"),
            SmushError::Decode(msg) => write!(f, "malformed stream: {msg}"),
            SmushError::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            SmushError::Eof => write!(f, "end of stream"),
        }
    }
}

impl std::error::Error for SmushError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SmushError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SmushError {
    fn from(err: std::io::Error) -> Self {
        SmushError::Io(err)
    }
}

/// A specialized `Result` type for `smush-rs`.
pub type Result<T> = std::result::Result<T, SmushError>;

/// Convenience constructor for a [`SmushError::Decode`].
pub fn decode_error<T>(msg: &'static str) -> Result<T> {
    Err(SmushError::Decode(msg))
}

/// Convenience constructor for a [`SmushError::Unsupported`].
pub fn unsupported_error<T>(msg: &'static str) -> Result<T> {
    Err(SmushError::Unsupported(msg))
}

/// Convenience constructor for a [`SmushError::Eof`].
pub fn end_of_stream_error<T>() -> Result<T> {
    Err(SmushError::Eof)
}
