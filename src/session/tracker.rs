//! Focus session state
//!
//! Holds the last and best samples of a focus session, the baseline
//! ratchet, a bounded history and the guidance for the last valid sample.
//! One tracker is shared by every presentation surface of a session; it is
//! mutated only on the owning thread and exposes snapshots and change
//! notifications to readers elsewhere.

use super::guidance::{derive_guidance, Advice};
use super::history::{History, HistoryEntry, DEFAULT_HISTORY_CAPACITY};
use crate::config::SessionConfig;
use crate::quality::Metrics;
use crate::types::FrameSummary;
use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Upper bound of the relative-progress indicator, in percent
pub const MAX_RELATIVE_PERCENT: f64 = 120.0;

/// What changed in a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerEventKind {
    SampleApplied,
    BestMarked,
    BaselineReset,
    PanelReset,
    FrameSummary,
}

/// Change notification delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerEvent {
    pub revision: u64,
    pub kind: TrackerEventKind,
    pub snapshot: SessionSnapshot,
}

/// Read-only copy of the tracker state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub revision: u64,
    pub last_metrics: Metrics,
    pub best_metrics: Metrics,
    pub best_composite: f64,
    pub has_baseline: bool,
    pub previous_composite: f64,
    pub relative_percent: f64,
    pub history: Vec<HistoryEntry>,
    pub guidance: Vec<Advice>,
    pub guidance_text: Vec<String>,
    pub frame_summary: Option<FrameSummary>,
}

#[derive(Debug)]
pub struct SessionTracker {
    last_metrics: Metrics,
    best_metrics: Metrics,
    best_composite: f64,
    has_baseline: bool,
    previous_composite: f64,
    relative_percent: f64,
    history: History,
    guidance: Vec<Advice>,
    frame_summary: Option<FrameSummary>,
    revision: u64,
    subscribers: Vec<Sender<TrackerEvent>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(history_capacity: usize) -> Self {
        Self {
            last_metrics: Metrics::default(),
            best_metrics: Metrics::default(),
            best_composite: 0.0,
            has_baseline: false,
            previous_composite: 0.0,
            relative_percent: 0.0,
            history: History::new(history_capacity),
            guidance: Vec::new(),
            frame_summary: None,
            revision: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::with_capacity(config.history_capacity)
    }

    /// Apply a freshly evaluated sample, timestamped now
    pub fn apply_metrics(&mut self, metrics: Metrics) {
        self.apply_metrics_at(metrics, Local::now());
    }

    /// Apply a sample with an explicit timestamp.
    ///
    /// Invalid samples and samples with a non-finite score are ignored.
    pub fn apply_metrics_at(&mut self, metrics: Metrics, timestamp: DateTime<Local>) {
        if !metrics.valid {
            log::trace!("Ignoring invalid focus sample");
            return;
        }
        if !metrics.composite_score.is_finite() {
            log::warn!(
                "Ignoring focus sample with non-finite score {}",
                metrics.composite_score
            );
            return;
        }
        let score = metrics.composite_score;

        if !self.has_baseline || score > self.best_composite {
            self.best_metrics = metrics;
            self.best_composite = score;
            self.has_baseline = true;
        }

        self.relative_percent =
            (score / self.best_composite.max(1.0) * 100.0).clamp(0.0, MAX_RELATIVE_PERCENT);

        self.history.push(HistoryEntry { timestamp, metrics });

        self.guidance = derive_guidance(
            &metrics,
            self.best_composite,
            self.has_baseline,
            self.previous_composite,
        );

        self.previous_composite = score;
        self.last_metrics = metrics;

        debug_assert!(self.best_composite >= self.last_metrics.composite_score);
        self.notify(TrackerEventKind::SampleApplied);
    }

    /// Make the last valid sample the best, even if it scores lower
    pub fn mark_best(&mut self) {
        if !self.last_metrics.valid {
            return;
        }
        self.best_metrics = self.last_metrics;
        self.best_composite = self.last_metrics.composite_score;
        self.has_baseline = true;
        self.relative_percent = (self.best_composite / self.best_composite.max(1.0) * 100.0)
            .clamp(0.0, MAX_RELATIVE_PERCENT);
        log::info!("Focus best marked at {:.2}", self.best_composite);
        self.notify(TrackerEventKind::BestMarked);
    }

    /// Clear the baseline, history and previous score
    pub fn reset_baseline(&mut self) {
        self.best_metrics = Metrics::default();
        self.best_composite = 0.0;
        self.has_baseline = false;
        self.previous_composite = 0.0;
        self.relative_percent = 0.0;
        self.history.clear();
        log::debug!("Focus baseline reset");
        self.notify(TrackerEventKind::BaselineReset);
    }

    /// Full reset: baseline plus last sample, frame summary and guidance
    pub fn reset_panel(&mut self) {
        self.best_metrics = Metrics::default();
        self.best_composite = 0.0;
        self.has_baseline = false;
        self.previous_composite = 0.0;
        self.relative_percent = 0.0;
        self.history.clear();
        self.last_metrics = Metrics::default();
        self.frame_summary = None;
        self.guidance.clear();
        log::debug!("Focus panel reset");
        self.notify(TrackerEventKind::PanelReset);
    }

    pub fn record_frame_summary(&mut self, summary: FrameSummary) {
        if self.frame_summary == Some(summary) {
            return;
        }
        self.frame_summary = Some(summary);
        self.notify(TrackerEventKind::FrameSummary);
    }

    pub fn last_metrics(&self) -> Metrics {
        self.last_metrics
    }

    pub fn best_metrics(&self) -> Metrics {
        self.best_metrics
    }

    pub fn has_baseline(&self) -> bool {
        self.has_baseline
    }

    pub fn best_composite(&self) -> f64 {
        self.best_composite
    }

    pub fn previous_composite(&self) -> f64 {
        self.previous_composite
    }

    pub fn relative_percent(&self) -> f64 {
        self.relative_percent
    }

    /// Copy of the history, most recent first
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.to_vec()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn guidance(&self) -> &[Advice] {
        &self.guidance
    }

    pub fn guidance_lines(&self) -> Vec<String> {
        self.guidance.iter().map(ToString::to_string).collect()
    }

    pub fn frame_summary(&self) -> Option<FrameSummary> {
        self.frame_summary
    }

    /// Bumped on every state change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            revision: self.revision,
            last_metrics: self.last_metrics,
            best_metrics: self.best_metrics,
            best_composite: self.best_composite,
            has_baseline: self.has_baseline,
            previous_composite: self.previous_composite,
            relative_percent: self.relative_percent,
            history: self.history.to_vec(),
            guidance: self.guidance.clone(),
            guidance_text: self.guidance_lines(),
            frame_summary: self.frame_summary,
        }
    }

    /// Receive a `TrackerEvent` after every change.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<TrackerEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, kind: TrackerEventKind) {
        self.revision += 1;
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        let revision = self.revision;
        self.subscribers.retain(|tx| {
            tx.send(TrackerEvent {
                revision,
                kind,
                snapshot: snapshot.clone(),
            })
            .is_ok()
        });
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}
