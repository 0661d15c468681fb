//! Non-blocking door pulse controller.
//!
//! The open sequence holds the door for several seconds, far longer than a
//! frame interval, so it runs on a dedicated worker thread. The handle's
//! capacity-1 channel is the overlap guard: one open may queue behind an
//! in-flight sequence, anything beyond that is rejected as busy. On
//! shutdown the worker always forces the actuator closed and de-energized
//! before exiting.

use crate::actuator::{DoorDriver, DoorError};
use facegate_core::{DoorControl, DoorDispatch};
use std::time::Duration;
use tokio::sync::mpsc;

/// Pause after the close pulse so the mechanism finishes travel before the
/// signal is cut.
const SETTLE: Duration = Duration::from_millis(700);

enum DoorCommand {
    Open,
}

/// Clone-safe dispatch handle given to the decision engine.
#[derive(Clone)]
pub struct DoorHandle {
    tx: mpsc::Sender<DoorCommand>,
}

impl DoorControl for DoorHandle {
    fn request_open(&self) -> DoorDispatch {
        match self.tx.try_send(DoorCommand::Open) {
            Ok(()) => DoorDispatch::Dispatched,
            Err(mpsc::error::TrySendError::Full(_)) => DoorDispatch::Busy,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::error!("door worker gone; open request dropped");
                DoorDispatch::Busy
            }
        }
    }
}

/// Owns the worker thread driving the actuator.
pub struct DoorController {
    tx: mpsc::Sender<DoorCommand>,
    worker: std::thread::JoinHandle<()>,
}

impl DoorController {
    /// Probe the driver and start the worker. The initial close doubles as
    /// the startup responsiveness check; its failure is fatal.
    pub fn spawn(
        mut driver: Box<dyn DoorDriver>,
        dwell: Duration,
    ) -> Result<Self, DoorError> {
        driver.close()?;
        driver.release()?;

        let (tx, mut rx) = mpsc::channel::<DoorCommand>(1);

        let worker = std::thread::Builder::new()
            .name("facegate-door".into())
            .spawn(move || {
                while let Some(DoorCommand::Open) = rx.blocking_recv() {
                    run_open_sequence(driver.as_mut(), dwell);
                }
                // Channel closed: force the safe state before exiting.
                if let Err(error) = driver.close().and_then(|()| driver.release()) {
                    tracing::error!(%error, "failed to safe the actuator at shutdown");
                } else {
                    tracing::info!("actuator safed; door worker exiting");
                }
            })
            .expect("failed to spawn door worker thread");

        Ok(Self { tx, worker })
    }

    pub fn handle(&self) -> DoorHandle {
        DoorHandle { tx: self.tx.clone() }
    }

    /// Stop the worker, waiting for any in-flight sequence and the final
    /// safe-close. Engine handles must be dropped first or the worker will
    /// keep serving them.
    pub fn shutdown(self) {
        let Self { tx, worker } = self;
        drop(tx);
        if worker.join().is_err() {
            tracing::error!("door worker panicked");
        }
    }
}

/// One full pulse: open, hold, close, settle, de-energize. No feedback
/// channel exists, so in-flight failures are logged only.
fn run_open_sequence(driver: &mut dyn DoorDriver, dwell: Duration) {
    tracing::info!("opening door");
    if let Err(error) = driver.open() {
        tracing::error!(%error, "door open failed");
    }
    std::thread::sleep(dwell);
    if let Err(error) = driver.close() {
        tracing::error!(%error, "door close failed");
    }
    std::thread::sleep(SETTLE);
    if let Err(error) = driver.release() {
        tracing::error!(%error, "door release failed");
    }
    tracing::info!("door closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Open,
        Close,
        Release,
    }

    #[derive(Clone, Default)]
    struct TestDriver {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl DoorDriver for TestDriver {
        fn open(&mut self) -> Result<(), DoorError> {
            self.events.lock().unwrap().push(Event::Open);
            Ok(())
        }
        fn close(&mut self) -> Result<(), DoorError> {
            self.events.lock().unwrap().push(Event::Close);
            Ok(())
        }
        fn release(&mut self) -> Result<(), DoorError> {
            self.events.lock().unwrap().push(Event::Release);
            Ok(())
        }
    }

    const DWELL: Duration = Duration::from_millis(50);

    fn wait_for_idle(events: &Arc<Mutex<Vec<Event>>>, expected_releases: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let releases =
                events.lock().unwrap().iter().filter(|e| **e == Event::Release).count();
            if releases >= expected_releases {
                return;
            }
            assert!(Instant::now() < deadline, "door sequence never finished");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_request_open_returns_before_dwell_elapses() {
        let driver = TestDriver::default();
        let events = Arc::clone(&driver.events);
        let controller = DoorController::spawn(Box::new(driver), DWELL).unwrap();

        let started = Instant::now();
        assert_eq!(controller.handle().request_open(), DoorDispatch::Dispatched);
        assert!(
            started.elapsed() < DWELL,
            "dispatch must not block for the hold period"
        );

        // startup probe (close+release) + one full sequence
        wait_for_idle(&events, 2);
        controller.shutdown();
    }

    #[test]
    fn test_overlapping_requests_are_bounded() {
        let driver = TestDriver::default();
        let events = Arc::clone(&driver.events);
        let controller = DoorController::spawn(Box::new(driver), Duration::from_millis(200)).unwrap();
        let handle = controller.handle();

        assert_eq!(handle.request_open(), DoorDispatch::Dispatched);
        // Give the worker time to take the first command off the channel
        std::thread::sleep(Duration::from_millis(50));
        // One more may queue; a third while the first still holds is busy
        assert_eq!(handle.request_open(), DoorDispatch::Dispatched);
        assert_eq!(handle.request_open(), DoorDispatch::Busy);

        wait_for_idle(&events, 3);
        drop(handle);
        controller.shutdown();

        let opens = events.lock().unwrap().iter().filter(|e| **e == Event::Open).count();
        assert_eq!(opens, 2, "the rejected request must not open the door");
    }

    #[test]
    fn test_shutdown_forces_safe_state() {
        let driver = TestDriver::default();
        let events = Arc::clone(&driver.events);
        let controller = DoorController::spawn(Box::new(driver), DWELL).unwrap();
        controller.shutdown();

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![Event::Close, Event::Release, Event::Close, Event::Release],
            "probe then shutdown must both end de-energized"
        );
    }

    #[test]
    fn test_startup_probe_failure_is_fatal() {
        struct DeadDriver;
        impl DoorDriver for DeadDriver {
            fn open(&mut self) -> Result<(), DoorError> {
                Err(DoorError::NodeMissing("/sys/class/pwm/pwmchip0".into()))
            }
            fn close(&mut self) -> Result<(), DoorError> {
                Err(DoorError::NodeMissing("/sys/class/pwm/pwmchip0".into()))
            }
            fn release(&mut self) -> Result<(), DoorError> {
                Err(DoorError::NodeMissing("/sys/class/pwm/pwmchip0".into()))
            }
        }

        assert!(DoorController::spawn(Box::new(DeadDriver), DWELL).is_err());
    }
}
