//! Focus session state and its live binding to the scheduler

pub mod export;
pub mod guidance;
pub mod history;
pub mod live;
pub mod registry;
pub mod tracker;

pub use export::ExportMap;
pub use guidance::{derive_guidance, Advice};
pub use history::{History, HistoryEntry, DEFAULT_HISTORY_CAPACITY};
pub use live::FocusSession;
pub use tracker::{SessionSnapshot, SessionTracker, TrackerEvent, TrackerEventKind};
