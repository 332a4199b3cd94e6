//! Ordered key for the (currently unpopulated) non-IACT audio track map.
//!
//! Grounded on `smushvideo.cpp`'s `operator<(SMUSHTrackHandle,
//! SMUSHTrackHandle)`: lexicographic ordering over (kind, id, max_frames).
//! Carried forward per `SPEC_FULL.md` §1.2 even though this reduced core
//! never inserts into a map keyed by it.

/// The kinds of audio track a SMUSH stream can (in principle) carry. Only
/// `Iact` is actually decoded by this core; the others are recognized by
/// the container dispatcher only far enough to be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackKind {
    Iact,
    Psad,
    Saud,
    Wave,
}

/// A totally-ordered identifier for an audio track, matching the original's
/// lexicographic `(type, id, maxFrames)` comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackHandle {
    pub kind: TrackKind,
    pub id: u16,
    pub max_frames: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_lexicographically_by_kind_then_id_then_max_frames() {
        let a = TrackHandle {
            kind: TrackKind::Iact,
            id: 5,
            max_frames: 1,
        };
        let b = TrackHandle {
            kind: TrackKind::Iact,
            id: 5,
            max_frames: 2,
        };
        let c = TrackHandle {
            kind: TrackKind::Psad,
            id: 0,
            max_frames: 0,
        };
        assert!(a < b);
        assert!(b < c);
    }
}
