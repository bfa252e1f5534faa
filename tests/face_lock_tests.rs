//! Face lock invariants: boxes stay inside the frame, locks drop exactly at the limit

mod test_helpers;

use mood_meter::face_lock::{pick_main_face, BoundingBox, FaceLockTracker, TrackState, Tracker};
use parking_lot::Mutex;
use proptest::prelude::*;
use rand::Rng;
use std::sync::Arc;
use test_helpers::{blank_frame, ScriptedDetector, ScriptedTracker, Step};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn lock_with(detections: Vec<Vec<BoundingBox>>, steps: Vec<Step>, lost_limit: u32) -> FaceLockTracker {
    let inits = Arc::new(Mutex::new(Vec::new()));
    let mut steps = Some(steps);
    FaceLockTracker::with_lost_limit(
        Box::new(ScriptedDetector::new(detections)),
        move || Box::new(ScriptedTracker::new(steps.take().unwrap_or_default(), Arc::clone(&inits))) as Box<dyn Tracker>,
        lost_limit,
    )
}

fn inside_frame(bbox: BoundingBox) -> bool {
    bbox.width > 0
        && bbox.height > 0
        && bbox.x >= 0
        && bbox.y >= 0
        && i64::from(bbox.x) + i64::from(bbox.width) <= i64::from(WIDTH)
        && i64::from(bbox.y) + i64::from(bbox.height) <= i64::from(HEIGHT)
}

#[test]
fn test_lock_drops_on_limit_not_before() {
    let face = BoundingBox::new(40, 40, 100, 100);
    let mut lock = lock_with(vec![vec![face]], vec![Step::Lost; 5], 5);
    let frame = blank_frame(WIDTH, HEIGHT);

    assert_eq!(lock.update(&frame), Some(face));
    assert_eq!(lock.state(), TrackState::Locked);

    for failures in 1..5 {
        assert_eq!(lock.update(&frame), None);
        assert_eq!(lock.state(), TrackState::Locked, "dropped after {failures} failures");
        assert_eq!(lock.lost_frames(), failures);
    }

    assert_eq!(lock.update(&frame), None);
    assert_eq!(lock.state(), TrackState::Searching);
}

#[test]
fn test_off_frame_tracker_boxes_release_lock() {
    let face = BoundingBox::new(10, 10, 60, 60);
    let mut lock = lock_with(vec![vec![face]], vec![Step::Found(BoundingBox::new(1000, 1000, 50, 50)); 50], 20);
    let frame = blank_frame(WIDTH, HEIGHT);

    assert_eq!(lock.update(&frame), Some(face));
    for _ in 0..19 {
        assert_eq!(lock.update(&frame), None);
        assert_eq!(lock.state(), TrackState::Locked);
    }

    assert_eq!(lock.update(&frame), None);
    assert_eq!(lock.state(), TrackState::Searching);
    assert_eq!(lock.lost_frames(), 0);
}

#[test]
fn test_off_frame_detections_are_not_locked() {
    let outside = BoundingBox::new(-500, -500, 200, 200);
    let visible = BoundingBox::new(30, 30, 50, 50);
    let mut lock = lock_with(vec![vec![outside], vec![outside, visible]], vec![Step::Found(visible)], 3);
    let frame = blank_frame(WIDTH, HEIGHT);

    assert_eq!(lock.update(&frame), None);
    assert_eq!(lock.state(), TrackState::Searching);

    assert_eq!(lock.update(&frame), Some(visible));
    assert_eq!(lock.state(), TrackState::Locked);
}

#[test]
fn test_tracker_errors_count_as_failures() {
    let face = BoundingBox::new(0, 0, 80, 80);
    let mut lock = lock_with(vec![vec![face]], vec![Step::Fail, Step::Fail], 2);
    let frame = blank_frame(WIDTH, HEIGHT);

    lock.update(&frame);
    lock.update(&frame);
    assert_eq!(lock.state(), TrackState::Locked);
    lock.update(&frame);
    assert_eq!(lock.state(), TrackState::Searching);
}

#[test]
fn test_success_resets_failure_count() {
    let face = BoundingBox::new(10, 10, 60, 60);
    let steps = vec![Step::Lost, Step::Lost, Step::Found(face), Step::Lost, Step::Lost];
    let mut lock = lock_with(vec![vec![face]], steps, 3);
    let frame = blank_frame(WIDTH, HEIGHT);

    for _ in 0..6 {
        lock.update(&frame);
    }
    assert_eq!(lock.state(), TrackState::Locked);
    assert_eq!(lock.lost_frames(), 2);
}

#[test]
fn test_largest_face_is_locked() {
    let small = BoundingBox::new(0, 0, 50, 50);
    let large = BoundingBox::new(100, 50, 120, 120);
    let mut lock = lock_with(vec![vec![small, large]], vec![], 20);

    assert_eq!(lock.update(&blank_frame(WIDTH, HEIGHT)), Some(large));
}

#[test]
fn test_pick_main_face_keeps_first_on_tie() {
    let a = BoundingBox::new(0, 0, 40, 40);
    let b = BoundingBox::new(50, 50, 40, 40);
    assert_eq!(pick_main_face(&[a, b]), Some(a));
    assert_eq!(pick_main_face(&[]), None);
}

#[test]
fn test_random_tracker_output_stays_in_frame() {
    let mut rng = rand::thread_rng();
    let frame = blank_frame(WIDTH, HEIGHT);

    for _ in 0..200 {
        let steps: Vec<Step> = (0..30)
            .map(|_| match rng.gen_range(0..4) {
                0 => Step::Lost,
                1 => Step::Fail,
                _ => Step::Found(BoundingBox::new(
                    rng.gen_range(-400..400),
                    rng.gen_range(-400..400),
                    rng.gen_range(-20..500),
                    rng.gen_range(-20..500),
                )),
            })
            .collect();
        let detections = vec![vec![BoundingBox::new(
            rng.gen_range(-100..300),
            rng.gen_range(-100..200),
            rng.gen_range(1..400),
            rng.gen_range(1..400),
        )]];

        let mut lock = lock_with(detections, steps, 20);
        for _ in 0..30 {
            if let Some(bbox) = lock.update(&frame) {
                assert!(inside_frame(bbox), "{bbox:?} escaped the frame");
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_clamped_boxes_are_inside_or_rejected(
        x in -1000i32..1000,
        y in -1000i32..1000,
        width in -100i32..2000,
        height in -100i32..2000,
    ) {
        if let Some(bbox) = BoundingBox::new(x, y, width, height).clamp_to_frame(WIDTH, HEIGHT) {
            prop_assert!(inside_frame(bbox));
        }
    }

    #[test]
    fn prop_detected_face_is_inside(
        x in -500i32..500,
        y in -500i32..500,
        width in 1i32..800,
        height in 1i32..800,
    ) {
        let mut lock = lock_with(vec![vec![BoundingBox::new(x, y, width, height)]], vec![], 20);
        if let Some(bbox) = lock.update(&blank_frame(WIDTH, HEIGHT)) {
            prop_assert!(inside_frame(bbox));
        }
    }
}
