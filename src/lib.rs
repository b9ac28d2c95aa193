//! crabfocus: focus and exposure quality evaluation for industrial camera consoles
//!
//! Turns a live grayscale frame plus an optional region of interest into one
//! stable "in-focus" score and tracks a focus session around it: best-known
//! score, rolling history and tuning guidance for the operator.
//!
//! # Features
//! - Statistical, multi-scale gradient and spectral sharpness measures
//! - Highlight/shadow clipping diagnostics and a composite score
//! - Session tracking with a baseline ratchet and guidance lines
//! - Throttled, coalescing evaluation on a worker thread
//! - Optional Tauri plugin (`plugin` feature)
//!
//! # Usage
//! ```rust,no_run
//! use crabfocus::{evaluate, FocusConfig, FocusSession, Roi};
//! use std::time::Duration;
//!
//! let frame = image::open("chart.png").unwrap().to_luma8();
//! let metrics = evaluate(&frame, Some(Roi::new(100, 100, 200, 200)));
//! println!("score {:.1}", metrics.composite_score);
//!
//! let mut session = FocusSession::new(&FocusConfig::default()).unwrap();
//! session.on_frame(frame);
//! session.pump_timeout(Duration::from_millis(500));
//! for line in session.tracker().guidance_lines() {
//!     println!("{line}");
//! }
//! ```
//!
//! As a Tauri plugin:
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(crabfocus::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
#[cfg(feature = "plugin")]
pub mod commands;
pub mod config;
pub mod errors;
pub mod quality;
pub mod scheduler;
pub mod session;
pub mod timing;
pub mod types;

// Testing utilities - synthetic focus charts for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::FocusConfig;
pub use errors::FocusError;
pub use quality::{evaluate, evaluate_async, evaluate_dynamic, evaluate_raw, Metrics};
pub use scheduler::{EvaluationScheduler, SchedulerStats, SubmitOutcome};
pub use session::{Advice, FocusSession, HistoryEntry, SessionSnapshot, SessionTracker};
pub use types::{FrameSummary, Roi};

#[cfg(feature = "plugin")]
use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

/// Initialize the crabfocus plugin with all commands
#[cfg(feature = "plugin")]
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("crabfocus")
        .invoke_handler(tauri::generate_handler![
            // Session commands
            commands::focus::open_focus_session,
            commands::focus::close_focus_session,
            commands::focus::submit_focus_frame,
            commands::focus::set_focus_roi,
            commands::focus::poll_focus_session,
            commands::focus::mark_focus_best,
            commands::focus::reset_focus_baseline,
            commands::focus::reset_focus_panel,
            commands::focus::get_focus_export,
            commands::focus::evaluate_focus_frame,
            // Configuration commands
            commands::config::get_config,
            commands::config::update_config,
            commands::config::reset_config,
        ])
        .build()
}

/// Initialize logging for the focus console
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabfocus=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        plugin: cfg!(feature = "plugin"),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Built with the Tauri command surface
    pub plugin: bool,
}
