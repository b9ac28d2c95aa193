use crate::commands::config::current_config;
use crate::quality::{self, Metrics};
use crate::scheduler::{SchedulerStats, SubmitOutcome};
use crate::session::{registry, ExportMap, SessionSnapshot};
use crate::types::Roi;
use serde::{Deserialize, Serialize};
use tauri::command;

/// Snapshot returned to the UI after pumping a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusPollResult {
    pub applied: usize,
    pub snapshot: SessionSnapshot,
    pub stats: SchedulerStats,
}

/// Open a focus session using the current configuration
#[command]
pub async fn open_focus_session() -> Result<String, String> {
    current_config()
        .and_then(|config| registry::open_session(&config))
        .map_err(|e| e.to_string())
}

#[command]
pub async fn close_focus_session(session_id: String) -> Result<(), String> {
    registry::close_session(&session_id).map_err(|e| e.to_string())
}

/// Submit a row-major 8-bit luma frame
#[command]
pub async fn submit_focus_frame(
    session_id: String,
    width: u32,
    height: u32,
    data: Vec<u8>,
) -> Result<SubmitOutcome, String> {
    registry::with_session(&session_id, |session| {
        session.on_raw_frame(width, height, data)
    })
    .map_err(|e| e.to_string())?
    .map_err(|e| e.to_string())
}

/// Change the ROI; `None` evaluates the whole frame
#[command]
pub async fn set_focus_roi(
    session_id: String,
    roi: Option<Roi>,
) -> Result<Option<SubmitOutcome>, String> {
    registry::with_session(&session_id, |session| session.set_roi(roi)).map_err(|e| e.to_string())
}

/// Apply finished evaluations and return the session state
#[command]
pub async fn poll_focus_session(session_id: String) -> Result<FocusPollResult, String> {
    registry::with_session(&session_id, |session| {
        let applied = session.pump();
        FocusPollResult {
            applied,
            snapshot: session.snapshot(),
            stats: session.stats(),
        }
    })
    .map_err(|e| e.to_string())
}

#[command]
pub async fn mark_focus_best(session_id: String) -> Result<SessionSnapshot, String> {
    registry::with_session(&session_id, |session| {
        session.tracker_mut().mark_best();
        session.snapshot()
    })
    .map_err(|e| e.to_string())
}

#[command]
pub async fn reset_focus_baseline(session_id: String) -> Result<SessionSnapshot, String> {
    registry::with_session(&session_id, |session| {
        session.tracker_mut().reset_baseline();
        session.snapshot()
    })
    .map_err(|e| e.to_string())
}

#[command]
pub async fn reset_focus_panel(session_id: String) -> Result<SessionSnapshot, String> {
    registry::with_session(&session_id, |session| {
        session.tracker_mut().reset_panel();
        session.snapshot()
    })
    .map_err(|e| e.to_string())
}

/// Flat `focus.*` metadata for snapshot writers
#[command]
pub async fn get_focus_export(session_id: String) -> Result<ExportMap, String> {
    registry::with_session(&session_id, |session| session.tracker().export_metadata())
        .map_err(|e| e.to_string())
}

/// One-off evaluation outside any session
#[command]
pub async fn evaluate_focus_frame(
    width: u32,
    height: u32,
    data: Vec<u8>,
    roi: Option<Roi>,
) -> Result<Metrics, String> {
    let frame = quality::frame_from_raw(width, height, data).map_err(|e| e.to_string())?;
    quality::evaluate_async(frame, roi)
        .await
        .map_err(|e| e.to_string())
}
