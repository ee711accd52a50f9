//! Commands for the crash recovery screen

use crate::crash::take_pending_crash_report;
use crate::AppState;

/// Report from the previous crash, if any
///
/// A report passed to a relaunched process wins over one left on disk.
/// Either is returned only once.
pub async fn get_pending_crash_report(state: &AppState) -> Result<Option<String>, String> {
    if let Some(report) = state.relaunched.take() {
        return Ok(Some(report));
    }

    let data_dir = state.data_dir().to_path_buf();
    tokio::task::spawn_blocking(move || take_pending_crash_report(&data_dir))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| format!("Failed to read crash report: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::app_state;
    use std::sync::Arc;

    use crate::crash::{CrashHandoff, FileHandoff, RelaunchedReport};

    #[tokio::test]
    async fn test_pending_report_is_returned_once() {
        let (state, dir) = app_state().await;
        assert_eq!(get_pending_crash_report(&state).await.unwrap(), None);

        FileHandoff::new(dir.path()).hand_off("=== report ===").unwrap();

        let report = get_pending_crash_report(&state).await.unwrap();
        assert_eq!(report.as_deref(), Some("=== report ==="));
        assert_eq!(get_pending_crash_report(&state).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_relaunch_report_is_returned_once() {
        let (mut state, dir) = app_state().await;
        state.relaunched = Arc::new(RelaunchedReport::new(Some("=== old crash ===".into())));
        FileHandoff::new(dir.path()).hand_off("=== on disk ===").unwrap();

        let first = get_pending_crash_report(&state).await.unwrap();
        assert_eq!(first.as_deref(), Some("=== old crash ==="));
        let second = get_pending_crash_report(&state).await.unwrap();
        assert_eq!(second.as_deref(), Some("=== on disk ==="));
        assert_eq!(get_pending_crash_report(&state).await.unwrap(), None);
    }
}
