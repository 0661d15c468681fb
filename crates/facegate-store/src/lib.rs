//! facegate-store: Persistence for the attendance gate.
//!
//! Loads the offline-built encoding store file, reads the student roster,
//! and keeps the durable attendance log with an atomic once-per-day insert.

pub mod attendance;
pub mod encodings;
pub mod roster;

pub use attendance::{AttendanceDb, AttendanceDbError};
pub use encodings::{EncodingStore, EncodingStoreError};
pub use roster::{load_roster, RosterError};
