//! Attendance decision engine.
//!
//! Per student per calendar day the state machine is {unmarked, marked};
//! marked is sticky for the rest of the day. A confirmed recognition
//! classifies the arrival, records it at most once via the attendance
//! log's atomic conditional insert, and dispatches the door and (for late
//! or half-day arrivals) a guardian notification.

use crate::schedule::DaySchedule;
use crate::types::{AttendanceStatus, Student, StudentId};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Durable attendance log collaborator.
///
/// `insert_if_absent` must be atomic on the (student, date) key: it returns
/// true only when this call created the record. This is the single source
/// of truth for once-per-day marking across restarts and across stations
/// sharing one store.
pub trait AttendanceLog {
    fn insert_if_absent(
        &mut self,
        student: StudentId,
        date: NaiveDate,
        time: chrono::NaiveTime,
        status: AttendanceStatus,
    ) -> anyhow::Result<bool>;
}

/// Guardian messaging collaborator. Best-effort: failures are logged by
/// the engine and never block marking.
pub trait Notifier {
    fn send(&self, text: &str, contact: &str) -> anyhow::Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn send(&self, text: &str, contact: &str) -> anyhow::Result<()> {
        (**self).send(text, contact)
    }
}

/// Outcome of asking the door controller for an open sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorDispatch {
    Dispatched,
    /// An open sequence is already running; the request was dropped.
    Busy,
}

/// Handle to the non-blocking door actuator controller.
pub trait DoorControl {
    fn request_open(&self) -> DoorDispatch;
}

/// What the engine decided for one confirmed recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Already marked today (in-memory or durable); no side effects.
    AlreadyMarked,
    /// A new record was written and side effects dispatched. The caller
    /// should reset the stability filter so the next episode starts clean.
    Marked(AttendanceStatus),
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// A lost attendance record is the core correctness failure here, so
    /// store errors abort the event; the marked-today set is left untouched
    /// and the next confirmed detection retries.
    #[error("attendance store: {0:#}")]
    Store(anyhow::Error),
    /// The encoding store referenced an id the roster does not know.
    #[error("unknown student id {0}")]
    UnknownStudent(StudentId),
}

/// Session state plus collaborators for the decision loop.
///
/// Marked-today and the cached date are explicit session state, owned here
/// rather than process globals, and only ever touched by the loop thread.
pub struct AttendanceEngine<L, N, D> {
    roster: HashMap<StudentId, Student>,
    schedule: DaySchedule,
    log: L,
    notifier: N,
    door: D,
    marked_today: HashSet<StudentId>,
    today: NaiveDate,
}

impl<L: AttendanceLog, N: Notifier, D: DoorControl> AttendanceEngine<L, N, D> {
    pub fn new(
        roster: Vec<Student>,
        schedule: DaySchedule,
        log: L,
        notifier: N,
        door: D,
        today: NaiveDate,
    ) -> Self {
        Self {
            roster: roster.into_iter().map(|s| (s.id, s)).collect(),
            schedule,
            log,
            notifier,
            door,
            marked_today: HashSet::new(),
            today,
        }
    }

    /// Handle one confirmed recognition at wall-clock `now`.
    pub fn on_confirmed(
        &mut self,
        student: StudentId,
        now: NaiveDateTime,
    ) -> Result<Decision, EngineError> {
        self.roll_over(now.date());

        if self.marked_today.contains(&student) {
            return Ok(Decision::AlreadyMarked);
        }

        let info = self
            .roster
            .get(&student)
            .ok_or(EngineError::UnknownStudent(student))?;

        let status = self.schedule.classify(now.time());
        let inserted = self
            .log
            .insert_if_absent(student, now.date(), now.time(), status)
            .map_err(EngineError::Store)?;

        if !inserted {
            // Durable record from a previous run; reconcile the cache and
            // skip side effects.
            tracing::debug!(student = %student, "already recorded today; reconciling cache");
            self.marked_today.insert(student);
            return Ok(Decision::AlreadyMarked);
        }

        let message = match status {
            AttendanceStatus::Late => {
                Some(format!("Late Entry: {} ({}) reached late.", info.name, info.usn))
            }
            AttendanceStatus::HalfDay => {
                Some(format!("Half Day: {} ({}) attended half day.", info.name, info.usn))
            }
            AttendanceStatus::Present | AttendanceStatus::Absent => None,
        };
        if let Some(text) = message {
            if let Err(error) = self.notifier.send(&text, &info.guardian_contact) {
                tracing::warn!(student = %student, %error, "guardian notification failed");
            }
        }

        if self.door.request_open() == DoorDispatch::Busy {
            tracing::warn!(student = %student, "door busy; open request dropped");
        }

        self.marked_today.insert(student);
        tracing::info!(
            student = %student,
            name = %info.name,
            usn = %info.usn,
            status = %status,
            "attendance marked"
        );
        Ok(Decision::Marked(status))
    }

    /// Clear daily state when the calendar date changes mid-process.
    fn roll_over(&mut self, date: NaiveDate) {
        if date != self.today {
            tracing::info!(from = %self.today, to = %date, "day rollover; clearing marked set");
            self.marked_today.clear();
            self.today = date;
        }
    }

    pub fn is_marked_today(&self, student: StudentId) -> bool {
        self.marked_today.contains(&student)
    }
}
