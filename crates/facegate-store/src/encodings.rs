//! Encoding store file: reference embeddings built by the offline
//! enrollment job.
//!
//! The file is a serialized pair of parallel lists: one reference
//! embedding per enrolled image, and the owning student id at the same
//! index. Loaded wholesale at startup and never mutated during a session.

use facegate_core::{Embedding, LinearMatcher, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodingStoreError {
    #[error("encodings file not found: {0}")]
    NotFound(String),
    #[error("failed to read encodings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed encodings file: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("encodings/ids length mismatch: {encodings} encodings, {ids} ids")]
    LengthMismatch { encodings: usize, ids: usize },
}

/// On-disk layout: parallel lists, equal length.
#[derive(Serialize, Deserialize)]
struct EncodingFile {
    encodings: Vec<Vec<f32>>,
    ids: Vec<i64>,
}

/// Immutable in-memory reference table.
#[derive(Debug)]
pub struct EncodingStore {
    refs: Vec<(StudentId, Embedding)>,
}

impl EncodingStore {
    /// Load and validate the encodings file. Missing, unreadable, or
    /// malformed files are fatal at startup.
    pub fn load(path: &Path) -> Result<Self, EncodingStoreError> {
        if !path.exists() {
            return Err(EncodingStoreError::NotFound(path.display().to_string()));
        }

        let raw = std::fs::read(path)?;
        let file: EncodingFile = serde_json::from_slice(&raw)?;

        if file.encodings.len() != file.ids.len() {
            return Err(EncodingStoreError::LengthMismatch {
                encodings: file.encodings.len(),
                ids: file.ids.len(),
            });
        }

        let refs: Vec<(StudentId, Embedding)> = file
            .ids
            .into_iter()
            .zip(file.encodings)
            .map(|(id, values)| (StudentId(id), Embedding { values }))
            .collect();

        let students: HashSet<StudentId> = refs.iter().map(|(id, _)| *id).collect();
        if refs.is_empty() {
            tracing::warn!("encodings file is empty; every face will be treated as unknown");
        } else {
            tracing::info!(
                encodings = refs.len(),
                students = students.len(),
                "loaded face encodings"
            );
        }

        Ok(Self { refs })
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Student ids present in the store, for startup cross-checks against
    /// the roster.
    pub fn student_ids(&self) -> HashSet<StudentId> {
        self.refs.iter().map(|(id, _)| *id).collect()
    }

    pub fn into_matcher(self) -> LinearMatcher {
        LinearMatcher::new(self.refs)
    }
}
