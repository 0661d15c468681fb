//! facegate-core: Recognition-to-attendance decision logic.
//!
//! Pure decision components for the attendance gate: nearest-embedding
//! identity matching, consecutive-frame debounce, time-of-day status
//! classification, the once-per-day attendance engine, and the
//! unknown-face sentinel. All hardware, storage, and network collaborators
//! sit behind traits defined in [`engine`].

pub mod engine;
pub mod matcher;
pub mod schedule;
pub mod sentinel;
pub mod stability;
pub mod types;

pub use engine::{
    AttendanceEngine, AttendanceLog, Decision, DoorControl, DoorDispatch, EngineError, Notifier,
};
pub use matcher::{LinearMatcher, MatchResult, Matcher};
pub use schedule::DaySchedule;
pub use sentinel::{SentinelPolicy, UnknownFaceSentinel};
pub use stability::StabilityFilter;
pub use types::{primary_face, AttendanceStatus, Detection, Embedding, FaceBox, Student, StudentId};
