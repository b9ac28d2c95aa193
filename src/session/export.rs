use super::tracker::SessionTracker;
use crate::quality::Metrics;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Flat key/value metadata for snapshot writers and other consumers
pub type ExportMap = BTreeMap<String, Value>;

fn insert_metrics(map: &mut ExportMap, prefix: &str, metrics: &Metrics) {
    map.insert(format!("{prefix}.valid"), json!(metrics.valid));
    for (name, value) in metrics.fields() {
        map.insert(format!("{prefix}.{name}"), json!(value));
    }
}

impl SessionTracker {
    /// Export the current and best samples plus session figures under
    /// stable `focus.*` keys.
    ///
    /// Frame and ROI keys are only present once a frame has been evaluated.
    pub fn export_metadata(&self) -> ExportMap {
        let mut map = ExportMap::new();
        insert_metrics(&mut map, "focus.current", &self.last_metrics());
        insert_metrics(&mut map, "focus.best", &self.best_metrics());

        map.insert("focus.has_baseline".into(), json!(self.has_baseline()));
        map.insert("focus.best_composite".into(), json!(self.best_composite()));
        map.insert(
            "focus.relative_percent".into(),
            json!(self.relative_percent()),
        );
        map.insert("focus.history_len".into(), json!(self.history_len()));

        if let Some(summary) = self.frame_summary() {
            map.insert("focus.frame.width".into(), json!(summary.frame_width));
            map.insert("focus.frame.height".into(), json!(summary.frame_height));
            let requested = summary
                .requested_roi
                .filter(|roi| !roi.is_empty())
                .map(|roi| roi.to_string())
                .unwrap_or_else(|| "full".to_string());
            map.insert("focus.roi.requested".into(), json!(requested));
            map.insert(
                "focus.roi.effective".into(),
                json!(summary.effective_region.to_string()),
            );
        }

        map
    }
}
