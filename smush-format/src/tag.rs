//! Four-character-code chunk tags.

use std::fmt;

/// A big-endian four-character chunk tag, e.g. `ANIM` or `FRME`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const fn new(tag: &[u8; 4]) -> Self {
        FourCc(*tag)
    }

    pub fn from_u32_be(v: u32) -> Self {
        FourCc(v.to_be_bytes())
    }

    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({:?})", self.as_str())
    }
}

pub const ANIM: FourCc = FourCc::new(b"ANIM");
pub const SANM: FourCc = FourCc::new(b"SANM");
pub const SAUD: FourCc = FourCc::new(b"SAUD");
pub const AHDR: FourCc = FourCc::new(b"AHDR");
pub const SHDR: FourCc = FourCc::new(b"SHDR");
pub const FLHD: FourCc = FourCc::new(b"FLHD");
pub const FRME: FourCc = FourCc::new(b"FRME");
pub const ANNO: FourCc = FourCc::new(b"ANNO");
pub const BL16: FourCc = FourCc::new(b"Bl16");
pub const WAVE: FourCc = FourCc::new(b"Wave");
pub const FOBJ: FourCc = FourCc::new(b"FOBJ");
pub const FTCH: FourCc = FourCc::new(b"FTCH");
pub const IACT: FourCc = FourCc::new(b"IACT");
pub const NPAL: FourCc = FourCc::new(b"NPAL");
pub const STOR: FourCc = FourCc::new(b"STOR");
pub const TEXT: FourCc = FourCc::new(b"TEXT");
pub const TRES: FourCc = FourCc::new(b"TRES");
pub const XPAL: FourCc = FourCc::new(b"XPAL");
