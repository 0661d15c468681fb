//! Time-of-day classification windows.

use crate::types::AttendanceStatus;
use chrono::NaiveTime;

/// Fixed daily windows for classifying an arrival time.
///
/// Boundary semantics match the deployed system exactly: arriving at the
/// on-time cutoff itself is still present, the late window is open on both
/// ends, and the half-day window is closed on both ends. Anything else
/// falls back to present.
#[derive(Debug, Clone, Copy)]
pub struct DaySchedule {
    /// Latest arrival still counted as present (inclusive).
    pub on_time_cutoff: NaiveTime,
    /// End of the late window (exclusive).
    pub late_cutoff: NaiveTime,
    /// Half-day window start (inclusive).
    pub half_day_start: NaiveTime,
    /// Half-day window end (inclusive).
    pub half_day_end: NaiveTime,
}

impl Default for DaySchedule {
    fn default() -> Self {
        Self {
            on_time_cutoff: hm(8, 50),
            late_cutoff: hm(9, 15),
            half_day_start: hm(12, 30),
            half_day_end: hm(13, 30),
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time literal")
}

impl DaySchedule {
    /// Classify an arrival time. Pure function of time-of-day.
    pub fn classify(&self, at: NaiveTime) -> AttendanceStatus {
        if at <= self.on_time_cutoff {
            AttendanceStatus::Present
        } else if at < self.late_cutoff {
            AttendanceStatus::Late
        } else if at >= self.half_day_start && at <= self.half_day_end {
            AttendanceStatus::HalfDay
        } else {
            AttendanceStatus::Present
        }
    }
}
