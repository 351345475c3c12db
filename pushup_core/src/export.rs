//! CSV export of completed sessions.

use crate::{Result, WorkoutSession};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    count: u32,
    completed_at: String,
    duration_seconds: f64,
    duration: String,
}

impl From<&WorkoutSession> for CsvRow {
    fn from(session: &WorkoutSession) -> Self {
        CsvRow {
            id: session.id.to_string(),
            count: session.count,
            completed_at: session.completed_at.to_rfc3339(),
            duration_seconds: session.duration_seconds,
            duration: session.formatted_duration(),
        }
    }
}

/// Write `history` to `path` as CSV, replacing any existing file
///
/// Rows keep the order given (newest first for engine history).
/// Returns the number of sessions written.
pub fn export_history_csv(history: &[WorkoutSession], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    for session in history {
        writer.serialize(CsvRow::from(session))?;
    }

    writer.flush()?;
    tracing::info!("Exported {} sessions to {:?}", history.len(), path);
    Ok(history.len())
}
