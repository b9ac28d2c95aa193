//! Process-wide registry of open focus sessions
//!
//! Sessions are keyed by a UUID string handed out by `open_session`. The
//! plugin commands are thin wrappers over these functions.

use super::live::FocusSession;
use crate::config::FocusConfig;
use crate::errors::FocusError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type SharedSession = Arc<Mutex<FocusSession>>;

lazy_static::lazy_static! {
    static ref SESSION_REGISTRY: Mutex<HashMap<String, SharedSession>> = Mutex::new(HashMap::new());
}

fn lookup(session_id: &str) -> Result<SharedSession, FocusError> {
    let registry = SESSION_REGISTRY
        .lock()
        .map_err(|_| FocusError::PoisonedLock)?;
    registry
        .get(session_id)
        .cloned()
        .ok_or_else(|| FocusError::SessionNotFound(session_id.to_string()))
}

/// Start a session and return its id
pub fn open_session(config: &FocusConfig) -> Result<String, FocusError> {
    let session = FocusSession::new(config)?;
    let session_id = uuid::Uuid::new_v4().to_string();

    SESSION_REGISTRY
        .lock()
        .map_err(|_| FocusError::PoisonedLock)?
        .insert(session_id.clone(), Arc::new(Mutex::new(session)));

    log::info!("Opened focus session {}", session_id);
    Ok(session_id)
}

/// Remove a session and join its worker
pub fn close_session(session_id: &str) -> Result<(), FocusError> {
    let session = SESSION_REGISTRY
        .lock()
        .map_err(|_| FocusError::PoisonedLock)?
        .remove(session_id)
        .ok_or_else(|| FocusError::SessionNotFound(session_id.to_string()))?;

    // Join outside the registry lock
    session
        .lock()
        .map_err(|_| FocusError::PoisonedLock)?
        .close();

    log::info!("Closed focus session {}", session_id);
    Ok(())
}

/// Run `f` with exclusive access to a session
pub fn with_session<R>(
    session_id: &str,
    f: impl FnOnce(&mut FocusSession) -> R,
) -> Result<R, FocusError> {
    let session = lookup(session_id)?;
    let mut guard = session.lock().map_err(|_| FocusError::PoisonedLock)?;
    if guard.is_closed() {
        return Err(FocusError::SessionClosed);
    }
    Ok(f(&mut *guard))
}

pub fn session_ids() -> Result<Vec<String>, FocusError> {
    let registry = SESSION_REGISTRY
        .lock()
        .map_err(|_| FocusError::PoisonedLock)?;
    let mut ids: Vec<String> = registry.keys().cloned().collect();
    ids.sort();
    Ok(ids)
}
