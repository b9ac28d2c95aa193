use crate::config::FocusConfig;
use crate::errors::FocusError;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tauri::command;

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: Arc<RwLock<FocusConfig>> = Arc::new(RwLock::new(FocusConfig::load_or_default()));
}

/// Configuration new focus sessions are opened with
pub(crate) fn current_config() -> Result<FocusConfig, FocusError> {
    let config = GLOBAL_CONFIG.read().map_err(|_| FocusError::PoisonedLock)?;
    Ok(config.clone())
}

/// Validate, install and persist a configuration.
///
/// Open sessions keep the scheduler and history they were created with.
fn install_config(new_config: FocusConfig, path: &Path) -> Result<FocusConfig, FocusError> {
    new_config.validate()?;

    {
        let mut config = GLOBAL_CONFIG.write().map_err(|_| FocusError::PoisonedLock)?;
        *config = new_config.clone();
    }
    log::info!(
        "Focus config installed (throttle {} ms, history {})",
        new_config.scheduler.throttle_interval_ms,
        new_config.session.history_capacity
    );

    new_config.save_to_file(path)?;
    Ok(new_config)
}

/// Get the current configuration
#[command]
pub async fn get_config() -> Result<FocusConfig, String> {
    current_config().map_err(|e| e.to_string())
}

/// Update configuration. Applies to sessions opened afterwards.
#[command]
pub async fn update_config(new_config: FocusConfig) -> Result<(), String> {
    install_config(new_config, &FocusConfig::default_path())
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Reset configuration to defaults
#[command]
pub async fn reset_config() -> Result<FocusConfig, String> {
    install_config(FocusConfig::default(), &FocusConfig::default_path())
        .map_err(|e| e.to_string())
}
