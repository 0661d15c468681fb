use serde::{Deserialize, Serialize};
use std::fmt;

/// Roster primary key for an enrolled student.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StudentId(pub i64);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display record for an enrolled student, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    /// Roster number (university serial number in the source schema).
    pub usn: String,
    /// Guardian contact for late / half-day notifications.
    pub guardian_contact: String,
    /// Folder of enrollment images this student's encodings were built from.
    pub dataset_folder: Option<String>,
}

/// Face embedding vector (dimension fixed by the embedding model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    /// Compute Euclidean distance between two embeddings.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Bounding box for a detected face, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceBox {
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// One detected face with its probe embedding. Transient: produced per
/// frame by the detector collaborator and discarded after matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: FaceBox,
    pub embedding: Embedding,
}

/// Pick the detection to feed into the recognition pipeline for this frame.
///
/// At most one face triggers attendance/door actions per cycle; the largest
/// bounding box wins (closest, most prominent face).
pub fn primary_face(detections: &[Detection]) -> Option<&Detection> {
    detections
        .iter()
        .max_by(|a, b| a.bbox.area().total_cmp(&b.bbox.area()))
}

/// Daily attendance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Late,
    HalfDay,
    Absent,
}

impl AttendanceStatus {
    /// Stable wire name used in the attendance table.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::HalfDay => "half_day",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
