//! End-to-end decision loop: matcher -> stability filter -> engine.

use chrono::{NaiveDate, NaiveDateTime};
use facegate_core::{
    AttendanceEngine, AttendanceLog, AttendanceStatus, Decision, DoorControl, DoorDispatch,
    Embedding, LinearMatcher, Matcher, Notifier, DaySchedule, StabilityFilter, Student, StudentId,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const ENROLLED: StudentId = StudentId(42);

#[derive(Clone, Default)]
struct MemoryLog {
    rows: Rc<RefCell<Vec<(StudentId, NaiveDate, AttendanceStatus)>>>,
}

impl AttendanceLog for MemoryLog {
    fn insert_if_absent(
        &mut self,
        student: StudentId,
        date: NaiveDate,
        _time: chrono::NaiveTime,
        status: AttendanceStatus,
    ) -> anyhow::Result<bool> {
        let mut rows = self.rows.borrow_mut();
        if rows.iter().any(|(s, d, _)| *s == student && *d == date) {
            return Ok(false);
        }
        rows.push((student, date, status));
        Ok(true)
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Rc<RefCell<Vec<(String, String)>>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, text: &str, contact: &str) -> anyhow::Result<()> {
        self.sent.borrow_mut().push((text.to_string(), contact.to_string()));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct CountingDoor {
    opens: Rc<Cell<u32>>,
}

impl DoorControl for CountingDoor {
    fn request_open(&self) -> DoorDispatch {
        self.opens.set(self.opens.get() + 1);
        DoorDispatch::Dispatched
    }
}

fn emb(values: &[f32]) -> Embedding {
    Embedding { values: values.to_vec() }
}

fn at(h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Student enrolled with 3 reference embeddings; probe lands at distance
/// 0.3 from one of them; K=5 confirmation; first confirmation at 09:00.
#[test]
fn test_enrolled_student_marked_late_exactly_once() {
    let matcher = LinearMatcher::new(vec![
        (ENROLLED, emb(&[1.0, 0.0, 0.0])),
        (ENROLLED, emb(&[0.0, 1.0, 0.0])),
        (ENROLLED, emb(&[0.0, 0.0, 1.0])),
    ]);
    let mut filter = StabilityFilter::new(5);

    let log = MemoryLog::default();
    let notifier = RecordingNotifier::default();
    let door = CountingDoor::default();
    let rows = Rc::clone(&log.rows);
    let sent = Rc::clone(&notifier.sent);
    let opens = Rc::clone(&door.opens);

    let roster = vec![Student {
        id: ENROLLED,
        name: "Asha Rao".into(),
        usn: "1RV21CS042".into(),
        guardian_contact: "+919900112233".into(),
        dataset_folder: None,
    }];
    let mut engine = AttendanceEngine::new(
        roster,
        DaySchedule::default(),
        log,
        notifier,
        door,
        at(9, 0).date(),
    );

    // Probe at distance 0.3 from the first reference embedding
    let probe = emb(&[1.0, 0.3, 0.0]);
    let threshold = 0.58;

    let mut side_effects = 0;
    for frame in 0..5 {
        let result = matcher.nearest(&probe);
        assert!((result.distance - 0.3).abs() < 1e-6);
        let accepted = result.accept(threshold);
        assert_eq!(accepted, Some(ENROLLED));

        if let Some(confirmed) = filter.observe(accepted) {
            assert_eq!(frame, 4, "confirmation must take exactly 5 frames");
            match engine.on_confirmed(confirmed, at(9, 0)).unwrap() {
                Decision::Marked(status) => {
                    assert_eq!(status, AttendanceStatus::Late);
                    filter.reset();
                    side_effects += 1;
                }
                Decision::AlreadyMarked => panic!("first confirmation must mark"),
            }
        }
    }
    assert_eq!(side_effects, 1);

    // 09:00 arrival is late: one guardian notification, one record, one door open
    {
        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "Late Entry: Asha Rao (1RV21CS042) reached late.");
        assert_eq!(sent[0].1, "+919900112233");
    }
    assert_eq!(rows.borrow().len(), 1);
    assert_eq!(opens.get(), 1);
    assert!(engine.is_marked_today(ENROLLED));

    // Repeat confirmed detection at 09:05: zero additional side effects
    for _ in 0..5 {
        if let Some(confirmed) = filter.observe(Some(ENROLLED)) {
            let decision = engine.on_confirmed(confirmed, at(9, 5)).unwrap();
            assert_eq!(decision, Decision::AlreadyMarked);
        }
    }
    assert_eq!(sent.borrow().len(), 1);
    assert_eq!(rows.borrow().len(), 1);
    assert_eq!(opens.get(), 1);
}

/// An unmatched probe must never reach the engine, and a frame-level miss
/// restarts the confirmation streak.
#[test]
fn test_flicker_never_confirms() {
    let matcher = LinearMatcher::new(vec![(ENROLLED, emb(&[1.0, 0.0, 0.0]))]);
    let mut filter = StabilityFilter::new(5);
    let threshold = 0.58;

    let near = emb(&[1.0, 0.3, 0.0]);
    let far = emb(&[-1.0, 0.0, 0.0]);

    // 4 good frames, one miss, 4 good frames: no confirmation
    let mut confirmations = 0;
    for probe in [&near, &near, &near, &near, &far, &near, &near, &near, &near] {
        let accepted = matcher.nearest(probe).accept(threshold);
        if filter.observe(accepted).is_some() {
            confirmations += 1;
        }
    }
    assert_eq!(confirmations, 0);
}
