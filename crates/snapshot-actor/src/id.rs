//! Clock-derived identifier allocation.

use crate::clock::Timestamp;

/// Hands out ids derived from the creation time that never repeat within one actor.
///
/// The id is the creation time in epoch milliseconds, bumped past the last id
/// handed out (or observed in a loaded snapshot) so that two creations in the
/// same millisecond, or a clock that steps backwards, still yield unique,
/// increasing ids.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, now: Timestamp) -> u64 {
        let from_clock = u64::try_from(now.as_millis()).unwrap_or(0);
        let id = from_clock.max(self.last.saturating_add(1));
        self.last = id;
        id
    }

    /// Records an id that exists in the collection so later ids sort after it.
    pub fn observe(&mut self, id: u64) {
        self.last = self.last.max(id);
    }
}
