//! Nearest-reference identity matching.
//!
//! Linear scan over every reference embedding, Euclidean metric. O(n) per
//! probe, which is fine at classroom scale; the [`Matcher`] trait is the
//! seam for swapping in an indexed nearest-neighbor structure later.

use crate::types::{Embedding, StudentId};

/// Result of matching one probe embedding against the reference set.
#[derive(Debug, Clone, Copy)]
pub struct MatchResult {
    /// Owner of the nearest reference embedding; `None` only when the
    /// reference set is empty.
    pub student: Option<StudentId>,
    /// Minimum distance over all reference embeddings. Infinite when the
    /// reference set is empty.
    pub distance: f32,
}

impl MatchResult {
    /// A positive identification requires the nearest distance to fall
    /// strictly below the configured threshold.
    pub fn accept(&self, threshold: f32) -> Option<StudentId> {
        self.student.filter(|_| self.distance < threshold)
    }
}

/// Strategy for finding the nearest enrolled identity for a probe.
pub trait Matcher {
    fn nearest(&self, probe: &Embedding) -> MatchResult;
}

/// Brute-force matcher over an in-memory reference table.
pub struct LinearMatcher {
    refs: Vec<(StudentId, Embedding)>,
}

impl LinearMatcher {
    pub fn new(refs: Vec<(StudentId, Embedding)>) -> Self {
        Self { refs }
    }

    /// Number of reference embeddings (not distinct students).
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

impl Matcher for LinearMatcher {
    fn nearest(&self, probe: &Embedding) -> MatchResult {
        let mut best: Option<StudentId> = None;
        let mut best_distance = f32::INFINITY;

        for (owner, reference) in &self.refs {
            let distance = probe.euclidean_distance(reference);
            if distance < best_distance {
                best_distance = distance;
                best = Some(*owner);
            }
        }

        MatchResult { student: best, distance: best_distance }
    }
}
