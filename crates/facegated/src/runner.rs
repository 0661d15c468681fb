//! The per-frame recognition loop.
//!
//! Single-threaded and cooperative: one frame per iteration, blocking only
//! on frame delivery. Door actuation is the sole work dispatched off this
//! thread. Nothing in the loop body is allowed to terminate the process;
//! single-frame failures are logged and the next frame proceeds.

use crate::detector::FrameSource;
use crate::snapshot::SnapshotWriter;
use chrono::Local;
use facegate_core::{
    primary_face, AttendanceEngine, AttendanceLog, Decision, DoorControl, Matcher, Notifier,
    SentinelPolicy, StabilityFilter, UnknownFaceSentinel,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Backoff after a failed capture before re-entering the loop.
const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(200);

pub struct Runner<S, M, L, N, D> {
    pub source: S,
    pub matcher: M,
    pub filter: StabilityFilter,
    pub engine: AttendanceEngine<L, N, D>,
    pub sentinel: UnknownFaceSentinel,
    pub snapshots: SnapshotWriter,
    pub match_threshold: f32,
}

impl<S, M, L, N, D> Runner<S, M, L, N, D>
where
    S: FrameSource,
    M: Matcher,
    L: AttendanceLog,
    N: Notifier,
    D: DoorControl,
{
    /// Run until `stop` is raised. Blocks the calling thread.
    pub fn run(mut self, stop: Arc<AtomicBool>) {
        tracing::info!("recognition loop running");
        while !stop.load(Ordering::Relaxed) {
            let report = match self.source.next_frame() {
                Ok(report) => report,
                Err(error) => {
                    tracing::warn!(%error, "frame capture failed; retrying");
                    std::thread::sleep(CAPTURE_RETRY_DELAY);
                    continue;
                }
            };

            let Some(detection) = primary_face(&report.faces) else {
                // Nothing in frame: reset debounce, end any unknown episode
                self.filter.observe(None);
                self.sentinel.observe(false, Instant::now());
                continue;
            };

            let result = self.matcher.nearest(&detection.embedding);
            match result.accept(self.match_threshold) {
                Some(student) => {
                    self.sentinel.observe(false, Instant::now());
                    let Some(confirmed) = self.filter.observe(Some(student)) else {
                        continue;
                    };
                    match self.engine.on_confirmed(confirmed, Local::now().naive_local()) {
                        Ok(Decision::Marked(status)) => {
                            tracing::debug!(student = %confirmed, %status, "marked; filter reset");
                            self.filter.reset();
                        }
                        Ok(Decision::AlreadyMarked) => {}
                        Err(error) => {
                            tracing::warn!(
                                student = %confirmed,
                                %error,
                                "marking failed; will retry on a later confirmation"
                            );
                        }
                    }
                }
                None => {
                    self.filter.observe(None);
                    if self.sentinel.observe(true, Instant::now()) {
                        self.handle_unknown(&report, result.distance);
                    }
                }
            }
        }
        tracing::info!("recognition loop stopped");
    }

    fn handle_unknown(&mut self, report: &crate::detector::FrameReport, distance: f32) {
        match self.snapshots.save(report, Local::now()) {
            Ok(path) => {
                tracing::warn!(
                    path = %path.display(),
                    distance,
                    "unknown face detected; snapshot saved"
                );
            }
            Err(error) => {
                tracing::warn!(%error, "failed to save unknown-face snapshot");
            }
        }
        if self.sentinel.policy() == SentinelPolicy::EdgeTriggered {
            if let Err(error) = self.snapshots.raise_alert() {
                tracing::warn!(%error, "failed to raise alert flag");
            }
        }
    }
}
