use chrono::NaiveTime;
use facegate_core::{DaySchedule, SentinelPolicy};
use std::path::PathBuf;
use std::time::Duration;

/// Which actuator driver to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorDriverKind {
    Servo,
    Relay,
}

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Unix socket of the detection/embedding sidecar.
    pub detector_socket: String,
    /// Read timeout for one frame report from the sidecar.
    pub frame_read_timeout: Duration,
    /// Path to the encoding store file built by the enrollment job.
    pub encodings_path: PathBuf,
    /// Path to the SQLite database (roster + attendance).
    pub db_path: PathBuf,
    /// Directory for unauthorized-face snapshots.
    pub snapshot_dir: PathBuf,
    /// Alert flag file raised on edge-triggered unknown detections.
    pub alert_flag_path: PathBuf,
    /// Notification gateway endpoint; notifications are disabled when unset.
    pub notify_url: Option<String>,
    pub notify_timeout: Duration,
    /// Euclidean distance below which a match is accepted.
    pub match_threshold: f32,
    /// Consecutive frames required to confirm an identity.
    pub confirm_frames: u32,
    pub schedule: DaySchedule,
    pub sentinel: SentinelPolicy,
    pub door_driver: DoorDriverKind,
    pub pwm_chip: u32,
    pub pwm_channel: u32,
    pub servo_open_us: u32,
    pub servo_closed_us: u32,
    pub relay_pin: u32,
    /// How long the door holds open before closing.
    pub door_dwell: Duration,
}

impl Config {
    /// Load configuration from `FACEGATE_*` environment variables with
    /// defaults. Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("facegate");

        let sentinel = match std::env::var("FACEGATE_SENTINEL_MODE").as_deref() {
            Ok("edge") => SentinelPolicy::EdgeTriggered,
            _ => SentinelPolicy::Interval(Duration::from_secs(env_u64(
                "FACEGATE_SNAPSHOT_INTERVAL_SECS",
                20,
            ))),
        };

        let door_driver = match std::env::var("FACEGATE_DOOR_DRIVER").as_deref() {
            Ok("relay") => DoorDriverKind::Relay,
            _ => DoorDriverKind::Servo,
        };

        Self {
            detector_socket: std::env::var("FACEGATE_DETECTOR_SOCKET")
                .unwrap_or_else(|_| "/run/facegate/detector.sock".to_string()),
            frame_read_timeout: Duration::from_secs(env_u64(
                "FACEGATE_FRAME_READ_TIMEOUT_SECS",
                5,
            )),
            encodings_path: std::env::var("FACEGATE_ENCODINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("encodings.json")),
            db_path: std::env::var("FACEGATE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("facegate.db")),
            snapshot_dir: std::env::var("FACEGATE_SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("unauthorized")),
            alert_flag_path: std::env::var("FACEGATE_ALERT_FLAG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("alert_flag")),
            notify_url: std::env::var("FACEGATE_NOTIFY_URL").ok(),
            notify_timeout: Duration::from_secs(env_u64("FACEGATE_NOTIFY_TIMEOUT_SECS", 5)),
            match_threshold: env_f32("FACEGATE_MATCH_THRESHOLD", 0.58),
            confirm_frames: env_u32("FACEGATE_CONFIRM_FRAMES", 5),
            schedule: DaySchedule {
                on_time_cutoff: env_time("FACEGATE_ON_TIME_CUTOFF", "08:50"),
                late_cutoff: env_time("FACEGATE_LATE_CUTOFF", "09:15"),
                half_day_start: env_time("FACEGATE_HALF_DAY_START", "12:30"),
                half_day_end: env_time("FACEGATE_HALF_DAY_END", "13:30"),
            },
            sentinel,
            door_driver,
            pwm_chip: env_u32("FACEGATE_PWM_CHIP", 0),
            pwm_channel: env_u32("FACEGATE_PWM_CHANNEL", 0),
            servo_open_us: env_u32("FACEGATE_SERVO_OPEN_US", 1500),
            servo_closed_us: env_u32("FACEGATE_SERVO_CLOSED_US", 500),
            relay_pin: env_u32("FACEGATE_RELAY_PIN", 17),
            door_dwell: Duration::from_secs(env_u64("FACEGATE_DOOR_DWELL_SECS", 4)),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_time(key: &str, default: &str) -> NaiveTime {
    let parse = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").ok();
    std::env::var(key)
        .ok()
        .and_then(|v| parse(&v))
        .or_else(|| parse(default))
        .expect("valid default time literal")
}
