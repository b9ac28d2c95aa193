//! Scheduler backpressure testing
//!
//! A gated evaluator holds each evaluation until the test releases it, so
//! coalescing and cancellation can be observed deterministically. Gates
//! time out so a failing assertion never leaves the worker stuck.

use crabfocus::quality::Metrics;
use crabfocus::scheduler::{EvaluationScheduler, Evaluator, SubmitOutcome};
use crabfocus::timing::Throttle;
use crabfocus::types::Roi;
use crossbeam_channel::{Receiver, Sender};
use image::GrayImage;
use std::sync::Arc;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(10);

fn frame(value: u8) -> GrayImage {
    GrayImage::from_pixel(32, 32, image::Luma([value]))
}

/// Reports the frame value when an evaluation starts, then blocks on the gate
fn gated_evaluator() -> (Evaluator, Sender<()>, Receiver<u8>) {
    let (gate_tx, gate_rx) = crossbeam_channel::unbounded::<()>();
    let (started_tx, started_rx) = crossbeam_channel::unbounded::<u8>();
    let evaluator: Evaluator = Arc::new(move |frame: &GrayImage, _roi: Option<Roi>| {
        let value = frame.get_pixel(0, 0)[0];
        let _ = started_tx.send(value);
        let _ = gate_rx.recv_timeout(WAIT);
        Metrics {
            valid: true,
            mean_intensity: value as f64,
            composite_score: value as f64,
            ..Metrics::default()
        }
    });
    (evaluator, gate_tx, started_rx)
}

fn instant_evaluator() -> Evaluator {
    Arc::new(|frame: &GrayImage, _roi: Option<Roi>| Metrics {
        valid: true,
        mean_intensity: frame.get_pixel(0, 0)[0] as f64,
        ..Metrics::default()
    })
}

#[test]
fn test_coalescing_keeps_latest_frame() {
    let (evaluator, gate, started) = gated_evaluator();
    let mut scheduler =
        EvaluationScheduler::with_evaluator(Throttle::from_millis(140), evaluator).unwrap();
    let t0 = Instant::now();

    assert_eq!(scheduler.submit_frame(frame(1), t0), SubmitOutcome::Dispatched);
    assert_eq!(started.recv_timeout(WAIT).unwrap(), 1);

    assert_eq!(scheduler.submit_frame(frame(2), t0), SubmitOutcome::Coalesced);
    assert_eq!(scheduler.submit_frame(frame(3), t0), SubmitOutcome::Coalesced);
    assert!(scheduler.has_pending());
    assert_eq!(scheduler.stats().coalesced, 1);

    gate.send(()).unwrap();
    let first = scheduler.poll_timeout(WAIT);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].metrics.mean_intensity, 1.0);

    // Pending frame dispatched on completion, skipping frame 2
    assert_eq!(started.recv_timeout(WAIT).unwrap(), 3);
    assert!(scheduler.is_busy());
    gate.send(()).unwrap();
    let second = scheduler.poll_timeout(WAIT);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].metrics.mean_intensity, 3.0);

    let stats = scheduler.stats();
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.completed, 2);
    assert!(started.try_recv().is_err());
}

#[test]
fn test_throttle_drops_frames_within_interval() {
    let mut scheduler =
        EvaluationScheduler::with_evaluator(Throttle::from_millis(140), instant_evaluator())
            .unwrap();
    let t0 = Instant::now();

    assert_eq!(scheduler.submit_frame(frame(1), t0), SubmitOutcome::Dispatched);
    assert_eq!(scheduler.poll_timeout(WAIT).len(), 1);

    assert_eq!(
        scheduler.submit_frame(frame(2), t0 + Duration::from_millis(50)),
        SubmitOutcome::Throttled
    );
    assert_eq!(
        scheduler.submit_frame(frame(3), t0 + Duration::from_millis(139)),
        SubmitOutcome::Throttled
    );
    assert_eq!(
        scheduler.submit_frame(frame(4), t0 + Duration::from_millis(140)),
        SubmitOutcome::Dispatched
    );
    let done = scheduler.poll_timeout(WAIT);
    assert_eq!(done[0].metrics.mean_intensity, 4.0);
    assert_eq!(scheduler.stats().throttled, 2);
}

#[test]
fn test_roi_change_bypasses_throttle() {
    let mut scheduler =
        EvaluationScheduler::with_evaluator(Throttle::from_millis(140), instant_evaluator())
            .unwrap();
    let t0 = Instant::now();
    let roi = Roi::new(4, 4, 16, 16);

    scheduler.submit_frame(frame(7), t0);
    scheduler.poll_timeout(WAIT);

    assert_eq!(
        scheduler.set_roi(Some(roi), t0 + Duration::from_millis(10)),
        Some(SubmitOutcome::Dispatched)
    );
    let done = scheduler.poll_timeout(WAIT);
    assert_eq!(done.len(), 1);
    let summary = done[0].summary.unwrap();
    assert_eq!(summary.requested_roi, Some(roi));
    assert_eq!(summary.effective_region, roi);

    // Same ROI again is a no-op
    assert_eq!(scheduler.set_roi(Some(roi), t0 + Duration::from_millis(20)), None);
}

#[test]
fn test_roi_change_while_busy_replaces_pending() {
    let (evaluator, gate, started) = gated_evaluator();
    let mut scheduler =
        EvaluationScheduler::with_evaluator(Throttle::from_millis(140), evaluator).unwrap();
    let t0 = Instant::now();
    let roi = Roi::new(0, 0, 16, 16);

    scheduler.submit_frame(frame(9), t0);
    started.recv_timeout(WAIT).unwrap();
    assert_eq!(scheduler.set_roi(Some(roi), t0), Some(SubmitOutcome::Coalesced));

    gate.send(()).unwrap();
    let first = scheduler.poll_timeout(WAIT);
    assert_eq!(first[0].summary.unwrap().requested_roi, None);

    started.recv_timeout(WAIT).unwrap();
    gate.send(()).unwrap();
    let second = scheduler.poll_timeout(WAIT);
    assert_eq!(second[0].summary.unwrap().requested_roi, Some(roi));
}

#[test]
fn test_cancel_discards_late_result() {
    let (evaluator, gate, started) = gated_evaluator();
    let mut scheduler =
        EvaluationScheduler::with_evaluator(Throttle::from_millis(140), evaluator).unwrap();

    scheduler.submit_frame(frame(5), Instant::now());
    started.recv_timeout(WAIT).unwrap();
    scheduler.cancel();

    gate.send(()).unwrap();
    let done = scheduler.poll_timeout(WAIT);
    assert!(done.is_empty());
    assert_eq!(scheduler.stats().discarded, 1);
    assert!(!scheduler.is_busy());

    // Cached frame was dropped too
    assert_eq!(scheduler.set_roi(Some(Roi::new(0, 0, 8, 8)), Instant::now()), None);
}

#[test]
fn test_shutdown_joins_and_discards() {
    let (evaluator, gate, started) = gated_evaluator();
    let mut scheduler =
        EvaluationScheduler::with_evaluator(Throttle::from_millis(140), evaluator).unwrap();

    scheduler.submit_frame(frame(6), Instant::now());
    started.recv_timeout(WAIT).unwrap();
    gate.send(()).unwrap();
    scheduler.shutdown();

    assert!(scheduler.is_closed());
    assert!(!scheduler.is_busy());
    let stats = scheduler.stats();
    assert_eq!(stats.completed, 0);
    assert_eq!(stats.discarded, 1);
    assert!(scheduler.poll().is_empty());
    assert_eq!(
        scheduler.submit_frame(frame(7), Instant::now()),
        SubmitOutcome::Closed
    );
}

fn panicking_evaluator() -> Evaluator {
    Arc::new(|frame: &GrayImage, _roi: Option<Roi>| {
        if frame.get_pixel(0, 0)[0] == 1 {
            panic!("evaluator failure");
        }
        Metrics {
            valid: true,
            ..Metrics::default()
        }
    })
}

#[test]
fn test_evaluator_panic_closes_scheduler() {
    let mut scheduler =
        EvaluationScheduler::with_evaluator(Throttle::from_millis(140), panicking_evaluator())
            .unwrap();
    let t0 = Instant::now();

    assert_eq!(scheduler.submit_frame(frame(1), t0), SubmitOutcome::Dispatched);
    assert!(scheduler.poll_timeout(WAIT).is_empty());

    assert!(scheduler.is_closed());
    assert!(!scheduler.is_busy());
    assert!(!scheduler.has_pending());
    assert_eq!(
        scheduler.submit_frame(frame(2), t0 + Duration::from_secs(1)),
        SubmitOutcome::Closed
    );
    assert_eq!(scheduler.stats().completed, 0);

    // Joining the dead worker is harmless
    scheduler.shutdown();
    assert!(scheduler.is_closed());
}

#[test]
fn test_evaluator_panic_drops_pending_frame() {
    let mut scheduler =
        EvaluationScheduler::with_evaluator(Throttle::from_millis(140), panicking_evaluator())
            .unwrap();
    let t0 = Instant::now();

    assert_eq!(scheduler.submit_frame(frame(1), t0), SubmitOutcome::Dispatched);
    assert_eq!(scheduler.submit_frame(frame(2), t0), SubmitOutcome::Coalesced);

    let done = scheduler.poll_timeout(WAIT);
    assert!(done.is_empty());
    assert!(scheduler.is_closed());
    assert!(!scheduler.has_pending());
}
