//! Consecutive-frame debounce for match results.
//!
//! A single noisy frame (motion blur, partial occlusion, bad angle) must
//! not trigger attendance or the door. An identity is confirmed only after
//! it wins the match on `confirm_after` immediately consecutive frames.

use crate::types::StudentId;
use std::collections::HashMap;

/// Per-identifier consecutive-confirmation counter.
///
/// Any frame with no accepted match, or with a different winning
/// identifier, resets the running count. Callers reset the whole filter
/// after a successful attendance marking so the next episode starts clean.
#[derive(Debug)]
pub struct StabilityFilter {
    counts: HashMap<StudentId, u32>,
    confirm_after: u32,
}

impl StabilityFilter {
    /// `confirm_after` is clamped to at least 1 (1 disables debounce).
    pub fn new(confirm_after: u32) -> Self {
        Self { counts: HashMap::new(), confirm_after: confirm_after.max(1) }
    }

    /// Feed one frame's accepted match (or lack of one). Returns the
    /// identifier once it has been seen on `confirm_after` consecutive
    /// frames; keeps returning it on further consecutive sightings, which
    /// the decision engine absorbs idempotently.
    pub fn observe(&mut self, seen: Option<StudentId>) -> Option<StudentId> {
        let Some(id) = seen else {
            self.counts.clear();
            return None;
        };

        if self.counts.keys().any(|k| *k != id) {
            self.counts.clear();
        }

        let count = self.counts.entry(id).or_insert(0);
        *count += 1;

        (*count >= self.confirm_after).then_some(id)
    }

    /// Clear every counter (called after any successful marking).
    pub fn reset(&mut self) {
        self.counts.clear();
    }
}
