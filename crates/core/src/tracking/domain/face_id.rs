use std::fmt;

use serde::Serialize;

/// Opaque identity of a face followed across frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FaceId(u64);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mints identities from a monotonic counter. Never reuses a value within
/// a run, even after the identity it issued has been evicted.
#[derive(Debug)]
pub struct FaceIdGenerator {
    next: u64,
}

impl FaceIdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn mint(&mut self) -> FaceId {
        let id = FaceId(self.next);
        self.next += 1;
        id
    }
}

impl Default for FaceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
