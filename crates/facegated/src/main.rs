use anyhow::{Context, Result};
use chrono::Local;
use facegate_core::{AttendanceEngine, Notifier, StabilityFilter, UnknownFaceSentinel};
use facegate_hw::{DoorController, DoorDriver, GpioRelay, PwmServo};
use facegate_store::{load_roster, AttendanceDb, EncodingStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod detector;
mod notify;
mod runner;
mod snapshot;

use config::{Config, DoorDriverKind};

const DETECTOR_CONNECT_RETRIES: u32 = 3;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("facegated starting");
    let cfg = Config::from_env();

    // Fail-fast startup: every collaborator must be responsive before the
    // recognition loop begins.
    let encodings =
        EncodingStore::load(&cfg.encodings_path).context("loading face encodings")?;

    let db = AttendanceDb::open(&cfg.db_path)
        .with_context(|| format!("opening attendance db {}", cfg.db_path.display()))?;
    let roster = load_roster(db.conn()).context("loading student roster")?;

    let enrolled: std::collections::HashSet<_> = roster.iter().map(|s| s.id).collect();
    for id in encodings.student_ids() {
        if !enrolled.contains(&id) {
            tracing::warn!(student = %id, "encoding store has an id missing from the roster");
        }
    }

    let driver: Box<dyn DoorDriver> = match cfg.door_driver {
        DoorDriverKind::Servo => Box::new(
            PwmServo::export(
                cfg.pwm_chip,
                cfg.pwm_channel,
                cfg.servo_open_us,
                cfg.servo_closed_us,
            )
            .context("initializing servo door driver")?,
        ),
        DoorDriverKind::Relay => Box::new(
            GpioRelay::export(cfg.relay_pin).context("initializing relay door driver")?,
        ),
    };
    let door = DoorController::spawn(driver, cfg.door_dwell)
        .context("door actuator failed its startup check")?;

    let notifier: Box<dyn Notifier + Send> = match &cfg.notify_url {
        Some(url) => Box::new(
            notify::GatewayNotifier::new(url, cfg.notify_timeout)
                .context("building notification client")?,
        ),
        None => {
            tracing::warn!("FACEGATE_NOTIFY_URL unset; guardian notifications disabled");
            Box::new(notify::NoopNotifier)
        }
    };

    let snapshots = snapshot::SnapshotWriter::new(&cfg.snapshot_dir, &cfg.alert_flag_path)
        .with_context(|| format!("preparing snapshot dir {}", cfg.snapshot_dir.display()))?;

    let source = detector::DetectorClient::connect(
        &cfg.detector_socket,
        cfg.frame_read_timeout,
        DETECTOR_CONNECT_RETRIES,
    )
    .context("connecting to detector sidecar")?;

    let engine = AttendanceEngine::new(
        roster,
        cfg.schedule,
        db,
        notifier,
        door.handle(),
        Local::now().date_naive(),
    );

    let runner = runner::Runner {
        source,
        matcher: encodings.into_matcher(),
        filter: StabilityFilter::new(cfg.confirm_frames),
        engine,
        sentinel: UnknownFaceSentinel::new(cfg.sentinel),
        snapshots,
        match_threshold: cfg.match_threshold,
    };

    let stop = Arc::new(AtomicBool::new(false));
    let loop_stop = Arc::clone(&stop);
    let loop_thread = std::thread::Builder::new()
        .name("facegate-loop".into())
        .spawn(move || runner.run(loop_stop))
        .context("spawning recognition loop thread")?;

    tracing::info!("facegated ready");
    tokio::signal::ctrl_c().await?;

    tracing::info!("facegated shutting down");
    stop.store(true, Ordering::Relaxed);
    // The loop observes the flag within one frame interval; the detector
    // read timeout bounds the wait.
    if loop_thread.join().is_err() {
        tracing::error!("recognition loop panicked");
    }
    // All engine-held door handles are gone once the loop exits; this
    // drains the worker and forces the actuator to its safe state.
    door.shutdown();
    tracing::info!("facegated stopped");

    Ok(())
}
