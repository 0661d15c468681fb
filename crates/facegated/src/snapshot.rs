//! Security snapshots for unmatched faces.

use crate::detector::FrameReport;
use anyhow::Context;
use chrono::{DateTime, Local};
use image::GrayImage;
use std::path::{Path, PathBuf};

/// Writes timestamped JPEG snapshots and the persistent alert flag that
/// the backend polls.
pub struct SnapshotWriter {
    dir: PathBuf,
    alert_flag: PathBuf,
}

impl SnapshotWriter {
    /// Create the snapshot directory if absent.
    pub fn new(dir: &Path, alert_flag: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf(), alert_flag: alert_flag.to_path_buf() })
    }

    /// Encode the frame as `UNAUTH_<timestamp>.jpg` in the snapshot
    /// directory and return the written path.
    pub fn save(&self, frame: &FrameReport, when: DateTime<Local>) -> anyhow::Result<PathBuf> {
        let img = GrayImage::from_raw(frame.width, frame.height, frame.gray.clone())
            .context("frame buffer does not match its stated dimensions")?;
        let path = self
            .dir
            .join(format!("UNAUTH_{}.jpg", when.format("%Y%m%d_%H%M%S")));
        img.save(&path)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        Ok(path)
    }

    /// Raise the alert flag for the external consumer. Clearing it is the
    /// backend's job.
    pub fn raise_alert(&self) -> std::io::Result<()> {
        std::fs::write(&self.alert_flag, "ALERT")
    }
}
