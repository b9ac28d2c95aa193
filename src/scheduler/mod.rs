//! Evaluation scheduling and backpressure
//!
//! Runs the metrics evaluator on a dedicated worker thread so the thread
//! receiving frames never computes an FFT. At most one evaluation is in
//! flight; frames arriving meanwhile coalesce into a single "latest wins"
//! pending slot. When idle, a fixed throttle gates how often a fresh
//! evaluation may start; ROI changes bypass it.
//!
//! The scheduler itself is owned by one session and is not shared between
//! threads: only the worker runs elsewhere, and its results come back over
//! a channel to be collected by `poll` on the owning thread.

use crate::config::SchedulerConfig;
use crate::errors::FocusError;
use crate::quality::{self, Metrics};
use crate::timing::Throttle;
use crate::types::{FrameSummary, Roi};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Evaluation function run on the worker thread
pub type Evaluator = Arc<dyn Fn(&GrayImage, Option<Roi>) -> Metrics + Send + Sync>;

/// A frame and the ROI it should be evaluated with
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub frame: Arc<GrayImage>,
    pub roi: Option<Roi>,
}

/// Result of an evaluation that is still current
#[derive(Debug, Clone)]
pub struct CompletedEvaluation {
    pub ticket: u64,
    pub metrics: Metrics,
    /// `None` when the frame was empty
    pub summary: Option<FrameSummary>,
    pub elapsed: Duration,
}

/// What happened to a frame handed to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Sent to the worker immediately
    Dispatched,
    /// Held as the pending frame behind the in-flight evaluation
    Coalesced,
    /// Dropped: the throttle interval has not elapsed
    Throttled,
    /// Dropped: the scheduler has been shut down
    Closed,
}

/// Running counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub submitted: u64,
    pub dispatched: u64,
    /// Pending frames replaced by a newer one before they could run
    pub coalesced: u64,
    pub throttled: u64,
    pub completed: u64,
    /// Results that arrived after a cancellation
    pub discarded: u64,
}

struct Job {
    ticket: u64,
    generation: u64,
    request: EvaluationRequest,
}

struct JobResult {
    ticket: u64,
    generation: u64,
    metrics: Metrics,
    summary: Option<FrameSummary>,
    elapsed: Duration,
}

pub struct EvaluationScheduler {
    job_tx: Option<Sender<Job>>,
    result_rx: Receiver<JobResult>,
    worker: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
    in_flight: Option<u64>,
    pending: Option<EvaluationRequest>,
    latest_frame: Option<Arc<GrayImage>>,
    roi: Option<Roi>,
    throttle: Throttle,
    next_ticket: u64,
    stats: SchedulerStats,
    closed: bool,
}

impl EvaluationScheduler {
    /// Start a scheduler running the standard metrics evaluator
    pub fn new(config: &SchedulerConfig) -> Result<Self, FocusError> {
        Self::with_evaluator(
            Throttle::from_millis(config.throttle_interval_ms),
            Arc::new(quality::evaluate),
        )
    }

    /// Start a scheduler running a custom evaluator
    pub fn with_evaluator(throttle: Throttle, evaluator: Evaluator) -> Result<Self, FocusError> {
        // One slot: a job is only sent when nothing is in flight
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(1);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<JobResult>();
        let generation = Arc::new(AtomicU64::new(0));

        let worker_generation = generation.clone();
        let worker = std::thread::Builder::new()
            .name("crabfocus-evaluator".to_string())
            .spawn(move || worker_loop(job_rx, result_tx, worker_generation, evaluator))
            .map_err(|e| FocusError::worker(format!("spawn failed: {e}")))?;

        log::debug!(
            "Evaluation scheduler started (throttle {} ms)",
            throttle.interval().as_millis()
        );

        Ok(Self {
            job_tx: Some(job_tx),
            result_rx,
            worker: Some(worker),
            generation,
            in_flight: None,
            pending: None,
            latest_frame: None,
            roi: None,
            throttle,
            next_ticket: 1,
            stats: SchedulerStats::default(),
            closed: false,
        })
    }

    pub fn roi(&self) -> Option<Roi> {
        self.roi
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// True while an evaluation (possibly a cancelled one) is running
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Offer a live frame for evaluation. Never blocks.
    pub fn submit_frame(&mut self, frame: GrayImage, now: Instant) -> SubmitOutcome {
        self.stats.submitted += 1;
        if self.closed {
            return SubmitOutcome::Closed;
        }
        let frame = Arc::new(frame);
        self.latest_frame = Some(frame.clone());
        let request = EvaluationRequest {
            frame,
            roi: self.roi,
        };
        self.schedule(request, now, false)
    }

    /// Change the ROI and re-evaluate the latest frame without waiting for
    /// the throttle.
    ///
    /// Returns `None` when the ROI is unchanged or no frame has arrived yet.
    pub fn set_roi(&mut self, roi: Option<Roi>, now: Instant) -> Option<SubmitOutcome> {
        if self.roi == roi {
            return None;
        }
        self.roi = roi;
        self.throttle.invalidate();
        log::debug!("ROI changed to {:?}, throttle invalidated", roi);

        if self.closed {
            return Some(SubmitOutcome::Closed);
        }
        let frame = self.latest_frame.clone()?;
        Some(self.schedule(EvaluationRequest { frame, roi }, now, true))
    }

    fn schedule(&mut self, request: EvaluationRequest, now: Instant, force: bool) -> SubmitOutcome {
        if self.in_flight.is_some() {
            if self.pending.replace(request).is_some() {
                self.stats.coalesced += 1;
            }
            return SubmitOutcome::Coalesced;
        }

        if !force && !self.throttle.is_ready(now) {
            self.stats.throttled += 1;
            return SubmitOutcome::Throttled;
        }

        self.dispatch(request, now)
    }

    fn dispatch(&mut self, request: EvaluationRequest, now: Instant) -> SubmitOutcome {
        let job_tx = match &self.job_tx {
            Some(tx) => tx,
            None => return SubmitOutcome::Closed,
        };

        let ticket = self.next_ticket;
        let job = Job {
            ticket,
            generation: self.generation.load(Ordering::SeqCst),
            request,
        };

        match job_tx.try_send(job) {
            Ok(()) => {
                self.next_ticket += 1;
                self.in_flight = Some(ticket);
                self.throttle.mark(now);
                self.stats.dispatched += 1;
                log::trace!("Dispatched evaluation #{}", ticket);
                SubmitOutcome::Dispatched
            }
            Err(TrySendError::Full(job)) => {
                // Only reachable if the worker still holds an unread job
                log::warn!("Evaluation slot occupied, holding frame as pending");
                self.pending = Some(job.request);
                SubmitOutcome::Coalesced
            }
            Err(TrySendError::Disconnected(_)) => {
                self.worker_lost();
                SubmitOutcome::Closed
            }
        }
    }

    /// Collect finished evaluations without blocking.
    ///
    /// Dispatches the pending frame as soon as the worker frees up.
    pub fn poll(&mut self) -> Vec<CompletedEvaluation> {
        let mut completed = Vec::new();
        loop {
            match self.result_rx.try_recv() {
                Ok(result) => self.handle_result(result, &mut completed),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.worker_lost();
                    break;
                }
            }
        }
        completed
    }

    /// Like `poll`, but waits up to `timeout` for the first result
    pub fn poll_timeout(&mut self, timeout: Duration) -> Vec<CompletedEvaluation> {
        let mut completed = Vec::new();
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => self.handle_result(result, &mut completed),
            Err(RecvTimeoutError::Timeout) => return completed,
            Err(RecvTimeoutError::Disconnected) => {
                self.worker_lost();
                return completed;
            }
        }
        completed.extend(self.poll());
        completed
    }

    fn handle_result(&mut self, result: JobResult, completed: &mut Vec<CompletedEvaluation>) {
        if self.in_flight == Some(result.ticket) {
            self.in_flight = None;
        }

        if result.generation != self.generation.load(Ordering::SeqCst) {
            self.stats.discarded += 1;
            log::debug!("Discarding stale evaluation #{}", result.ticket);
        } else {
            self.stats.completed += 1;
            completed.push(CompletedEvaluation {
                ticket: result.ticket,
                metrics: result.metrics,
                summary: result.summary,
                elapsed: result.elapsed,
            });
        }

        if self.in_flight.is_none() && !self.closed {
            if let Some(request) = self.pending.take() {
                // Catch-up step: no throttle delay
                self.dispatch(request, Instant::now());
            }
        }
    }

    /// The worker exited on its own, most likely from a panicking evaluator.
    ///
    /// Nothing in flight will ever complete, so the scheduler closes and
    /// later frames report `Closed`.
    fn worker_lost(&mut self) {
        if !self.closed {
            log::warn!("Evaluation worker exited unexpectedly, closing scheduler");
        }
        self.closed = true;
        self.job_tx = None;
        self.in_flight = None;
        self.pending = None;
    }

    /// Cancel the in-flight evaluation and drop the pending and cached frames.
    ///
    /// A result already being computed will be discarded when it arrives.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.pending = None;
        self.latest_frame = None;
        self.throttle.invalidate();
        log::debug!("Evaluation cancelled");
    }

    /// Cancel, stop the worker and wait for it to exit
    pub fn shutdown(&mut self) {
        if self.closed && self.worker.is_none() {
            return;
        }
        self.cancel();
        self.closed = true;
        self.job_tx = None;

        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::warn!("Evaluation worker panicked");
            }
        }

        // Anything still queued belongs to a cancelled generation
        while let Ok(result) = self.result_rx.try_recv() {
            self.handle_result(result, &mut Vec::new());
        }
        self.in_flight = None;
        log::debug!("Evaluation scheduler shut down");
    }
}

impl Drop for EvaluationScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    job_rx: Receiver<Job>,
    result_tx: Sender<JobResult>,
    generation: Arc<AtomicU64>,
    evaluator: Evaluator,
) {
    for job in job_rx.iter() {
        let started = Instant::now();
        let frame: &GrayImage = &job.request.frame;

        let (metrics, summary) = if job.generation == generation.load(Ordering::SeqCst) {
            let metrics = evaluator(frame, job.request.roi);
            let summary = quality::effective_region(frame.width(), frame.height(), job.request.roi)
                .map(|effective_region| FrameSummary {
                    frame_width: frame.width(),
                    frame_height: frame.height(),
                    requested_roi: job.request.roi,
                    effective_region,
                });
            (metrics, summary)
        } else {
            // Cancelled before it started; report back so the slot frees up
            (Metrics::invalid(), None)
        };

        let result = JobResult {
            ticket: job.ticket,
            generation: job.generation,
            metrics,
            summary,
            elapsed: started.elapsed(),
        };
        if result_tx.send(result).is_err() {
            break;
        }
    }
}
