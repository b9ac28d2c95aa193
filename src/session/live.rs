use super::tracker::{SessionSnapshot, SessionTracker};
use crate::config::FocusConfig;
use crate::errors::FocusError;
use crate::quality;
use crate::scheduler::{CompletedEvaluation, EvaluationScheduler, SchedulerStats, SubmitOutcome};
use crate::types::Roi;
use image::GrayImage;
use std::time::{Duration, Instant};

/// One live focus session: a scheduler feeding a tracker.
///
/// Frames go in through `on_frame`; `pump` collects finished evaluations on
/// the calling thread and applies them to the tracker.
pub struct FocusSession {
    tracker: SessionTracker,
    scheduler: EvaluationScheduler,
}

impl FocusSession {
    pub fn new(config: &FocusConfig) -> Result<Self, FocusError> {
        let scheduler = EvaluationScheduler::new(&config.scheduler)?;
        let tracker = SessionTracker::from_config(&config.session);
        Ok(Self::from_parts(tracker, scheduler))
    }

    pub fn from_parts(tracker: SessionTracker, scheduler: EvaluationScheduler) -> Self {
        Self { tracker, scheduler }
    }

    pub fn on_frame(&mut self, frame: GrayImage) -> SubmitOutcome {
        self.on_frame_at(frame, Instant::now())
    }

    pub fn on_frame_at(&mut self, frame: GrayImage, now: Instant) -> SubmitOutcome {
        self.scheduler.submit_frame(frame, now)
    }

    /// Submit a row-major luma buffer from a camera callback
    pub fn on_raw_frame(
        &mut self,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<SubmitOutcome, FocusError> {
        let frame = quality::frame_from_raw(width, height, data)?;
        Ok(self.on_frame(frame))
    }

    pub fn roi(&self) -> Option<Roi> {
        self.scheduler.roi()
    }

    pub fn set_roi(&mut self, roi: Option<Roi>) -> Option<SubmitOutcome> {
        self.set_roi_at(roi, Instant::now())
    }

    pub fn set_roi_at(&mut self, roi: Option<Roi>, now: Instant) -> Option<SubmitOutcome> {
        self.scheduler.set_roi(roi, now)
    }

    /// Apply finished evaluations. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let completed = self.scheduler.poll();
        self.apply(completed)
    }

    /// Like `pump`, waiting up to `timeout` for the first result
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        let completed = self.scheduler.poll_timeout(timeout);
        self.apply(completed)
    }

    fn apply(&mut self, completed: Vec<CompletedEvaluation>) -> usize {
        let count = completed.len();
        for done in completed {
            if let Some(summary) = done.summary {
                self.tracker.record_frame_summary(summary);
            }
            log::trace!(
                "Applying evaluation #{} ({:.2} in {:?})",
                done.ticket,
                done.metrics.composite_score,
                done.elapsed
            );
            self.tracker.apply_metrics(done.metrics);
        }
        count
    }

    /// The frame source went away: cancel pending work and clear the panel
    pub fn source_lost(&mut self) {
        log::info!("Focus source lost, clearing session state");
        self.scheduler.cancel();
        self.tracker.reset_panel();
    }

    /// Stop the worker; later frames are reported as `Closed`
    pub fn close(&mut self) {
        self.scheduler.shutdown();
    }

    pub fn is_closed(&self) -> bool {
        self.scheduler.is_closed()
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut SessionTracker {
        &mut self.tracker
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tracker.snapshot()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic_data::checkerboard;

    #[test]
    fn test_frame_reaches_tracker() {
        let mut session = FocusSession::new(&FocusConfig::default()).unwrap();
        assert_eq!(session.on_frame(checkerboard(64, 8)), SubmitOutcome::Dispatched);
        assert_eq!(session.pump_timeout(Duration::from_secs(10)), 1);

        let tracker = session.tracker();
        assert!(tracker.last_metrics().valid);
        assert!(tracker.has_baseline());
        assert_eq!(tracker.history_len(), 1);
        assert_eq!(tracker.frame_summary().unwrap().frame_width, 64);
    }

    #[test]
    fn test_source_lost_clears_panel() {
        let mut session = FocusSession::new(&FocusConfig::default()).unwrap();
        session.on_frame(checkerboard(64, 8));
        session.pump_timeout(Duration::from_secs(10));
        session.source_lost();
        assert!(!session.tracker().last_metrics().valid);
        assert!(session.tracker().frame_summary().is_none());
        // No cached frame, so an ROI change has nothing to re-evaluate
        assert_eq!(session.set_roi(Some(Roi::new(0, 0, 16, 16))), None);
    }

    #[test]
    fn test_raw_frame_size_checked() {
        let mut session = FocusSession::new(&FocusConfig::default()).unwrap();
        assert!(session.on_raw_frame(8, 8, vec![0; 10]).is_err());
        session.close();
        assert!(session.is_closed());
        assert_eq!(
            session.on_raw_frame(8, 8, vec![0; 64]).unwrap(),
            SubmitOutcome::Closed
        );
    }

    #[test]
    fn test_worker_failure_closes_session() {
        use crate::quality::Metrics;
        use crate::scheduler::Evaluator;
        use crate::timing::Throttle;
        use std::sync::Arc;

        let evaluator: Evaluator = Arc::new(|_frame: &GrayImage, _roi: Option<Roi>| -> Metrics {
            panic!("evaluator failure")
        });
        let scheduler =
            EvaluationScheduler::with_evaluator(Throttle::from_millis(140), evaluator).unwrap();
        let mut session = FocusSession::from_parts(SessionTracker::new(), scheduler);

        assert_eq!(session.on_frame(checkerboard(64, 8)), SubmitOutcome::Dispatched);
        assert_eq!(session.pump_timeout(Duration::from_secs(10)), 0);
        assert!(session.is_closed());
        assert_eq!(session.on_frame(checkerboard(64, 8)), SubmitOutcome::Closed);
        assert!(!session.tracker().last_metrics().valid);
    }
}
