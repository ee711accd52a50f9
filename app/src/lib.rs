//! Family Tree Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: SQLite store, repositories and change streams
//! - geocoding: Place search with provider fallback
//! - crash: Panic hook and crash reports
//! - commands: Functions the UI calls

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

pub mod commands;
pub mod config;
pub mod crash;
pub mod domain;
pub mod geocoding;
pub mod repository;

use config::AppConfig;
use crash::{build_handoff, effective_handoff, CrashHandler, RelaunchedReport};
use geocoding::FallbackGeocoder;
use repository::{
    init_db, DbState, LifeEventRepository, MediaRepository, MemberRepository, RelationshipRepository,
    TreeRepository,
};

/// Application state shared across commands
#[derive(Clone)]
pub struct AppState {
    pub db_state: DbState,
    pub data_dir: PathBuf,
    pub config: AppConfig,
    pub tree_repo: TreeRepository,
    pub member_repo: MemberRepository,
    pub relationship_repo: RelationshipRepository,
    pub life_event_repo: LifeEventRepository,
    pub media_repo: MediaRepository,
    pub geocoder: FallbackGeocoder,
    /// Report carried in by a crash relaunch, if this process is one
    pub relaunched: Arc<RelaunchedReport>,
}

impl AppState {
    /// Full startup: config, logging, crash hook, then the store
    pub async fn initialize(data_dir: PathBuf) -> Result<Self, String> {
        let relaunched = RelaunchedReport::from_env();
        std::fs::create_dir_all(&data_dir).map_err(|e| format!("Failed to create data dir: {}", e))?;

        let config = AppConfig::load(&data_dir).map_err(|e| e.to_string())?;

        rolling_logger::init_logger_with(
            data_dir.join("logs"),
            "FamilyTree",
            (&config.logging).into(),
        )?;

        install_crash_handler(&data_dir, &config, relaunched.is_relaunch())
            .map_err(|e| format!("Failed to install crash handler: {}", e))?;

        let state = Self::open(data_dir, config).await.map(|mut state| {
            state.relaunched = Arc::new(relaunched);
            state
        });
        match &state {
            Ok(_) => {
                let _ = rolling_logger::info("Family tree backend ready");
            }
            Err(e) => {
                let _ = rolling_logger::error(&format!("Startup failed: {}", e));
            }
        }
        state
    }

    /// Open the store and build repositories without touching process-wide hooks
    pub async fn open(data_dir: PathBuf, config: AppConfig) -> Result<Self, String> {
        let db_path = config.database_path(&data_dir);
        let db_state = init_db(&db_path).await.map_err(|e| e.to_string())?;

        let geocoder = FallbackGeocoder::from_config(&config.geocoding).map_err(|e| e.to_string())?;

        Ok(Self {
            tree_repo: TreeRepository::new(db_state.clone()),
            member_repo: MemberRepository::new(db_state.clone()),
            relationship_repo: RelationshipRepository::new(db_state.clone()),
            life_event_repo: LifeEventRepository::new(db_state.clone()),
            media_repo: MediaRepository::new(db_state.clone()),
            db_state,
            data_dir,
            config,
            geocoder,
            relaunched: Arc::new(RelaunchedReport::default()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn install_crash_handler(data_dir: &Path, config: &AppConfig, relaunched: bool) -> std::io::Result<()> {
    let kind = effective_handoff(config.crash.handoff, relaunched);
    if kind != config.crash.handoff {
        warn!("Started by a crash relaunch, keeping further crash reports on disk");
    }
    CrashHandler::new(build_handoff(kind, data_dir)?, &config.crash).install();
    info!("Crash handler installed ({:?} hand-off)", kind);
    Ok(())
}
