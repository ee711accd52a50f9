//! Commands Layer
//!
//! Async handlers the UI calls. Each takes the shared [`AppState`] and
//! returns `Result<T, String>` so errors cross the bridge as plain text.
//!
//! [`AppState`]: crate::AppState

mod tree_cmd;
mod member_cmd;
mod relationship_cmd;
mod event_cmd;
mod media_cmd;
mod location_cmd;
mod crash_cmd;

pub use tree_cmd::*;
pub use member_cmd::*;
pub use relationship_cmd::*;
pub use event_cmd::*;
pub use media_cmd::*;
pub use location_cmd::*;
pub use crash_cmd::*;

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use crate::config::AppConfig;
    use crate::AppState;

    /// State over a fresh database in a temp dir; keep the dir alive
    pub async fn app_state() -> (AppState, TempDir) {
        app_state_with(AppConfig::default()).await
    }

    pub async fn app_state_with(config: AppConfig) -> (AppState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path().to_path_buf(), config).await.unwrap();
        (state, dir)
    }
}
