//! Database Connection and Setup
//!
//! Owns the single SQLite connection, creates the schema and tracks
//! per-table changes for the observe streams.
//!
//! Schema changes are destructive: when `PRAGMA user_version` does not match
//! [`SCHEMA_VERSION`] every table is dropped and recreated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use log::{info, warn};
use rusqlite::Connection;
use tokio::sync::{watch, Mutex};

use crate::domain::DomainResult;

pub const SCHEMA_VERSION: i32 = 1;

/// Tables that observers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Trees,
    Members,
    Relationships,
    LifeEvents,
    Media,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Trees,
        Table::Members,
        Table::Relationships,
        Table::LifeEvents,
        Table::Media,
    ];

    /// Tables emptied by a cascade when a member is removed
    pub const MEMBER_CASCADE: [Table; 4] = [
        Table::Members,
        Table::Relationships,
        Table::LifeEvents,
        Table::Media,
    ];
}

/// Version counter per table, bumped after every committed write
struct ChangeTracker {
    senders: HashMap<Table, watch::Sender<u64>>,
}

impl ChangeTracker {
    fn new() -> Self {
        let senders = Table::ALL
            .into_iter()
            .map(|table| (table, watch::channel(0u64).0))
            .collect();
        Self { senders }
    }

    fn notify(&self, table: Table) {
        if let Some(sender) = self.senders.get(&table) {
            sender.send_modify(|version| *version = version.wrapping_add(1));
        }
    }

    fn subscribe(&self, table: Table) -> Option<watch::Receiver<u64>> {
        self.senders.get(&table).map(|sender| sender.subscribe())
    }
}

/// Database state wrapper
///
/// Cheap to clone; every clone shares the same connection and change
/// tracker. Built once at startup and handed to each repository.
#[derive(Clone)]
pub struct DbState {
    pub conn: Arc<Mutex<Option<Connection>>>,
    changes: Arc<ChangeTracker>,
    path: PathBuf,
}

impl DbState {
    /// Create a state without a connection (filled in by [`init_db`])
    pub fn new(path: PathBuf) -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            changes: Arc::new(ChangeTracker::new()),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Drop the connection; repositories report "not initialized" afterwards
    pub async fn close(&self) {
        *self.conn.lock().await = None;
    }

    pub fn notify(&self, table: Table) {
        self.changes.notify(table);
    }

    pub fn notify_all(&self, tables: &[Table]) {
        for table in tables {
            self.changes.notify(*table);
        }
    }

    pub fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        match self.changes.subscribe(table) {
            Some(rx) => rx,
            // Every table is registered in ChangeTracker::new
            None => watch::channel(0u64).1,
        }
    }
}

/// Open the database at `db_path` (or in memory for `":memory:"`) and
/// bring the schema to [`SCHEMA_VERSION`]
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = if db_path == Path::new(":memory:") {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Connection::open(db_path)?
    };

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    run_migrations(&conn)?;

    let state = DbState::new(db_path.to_path_buf());
    *state.conn.lock().await = Some(conn);

    info!("Database ready at {} (schema v{})", db_path.display(), SCHEMA_VERSION);
    Ok(state)
}

fn user_version(conn: &Connection) -> DomainResult<i32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

fn user_tables(conn: &Connection) -> DomainResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<Result<Vec<String>, _>>()?)
}

/// Drop every user table, used when the stored schema is from another version
fn drop_all_tables(conn: &Connection) -> DomainResult<()> {
    let tables = user_tables(conn)?;

    conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
    for table in &tables {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS \"{}\";", table.replace('"', "\"\"")))?;
    }
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    let version = user_version(conn)?;
    // Version 0 is a fresh file unless something already created tables in it
    let stale = match version {
        SCHEMA_VERSION => false,
        0 => !user_tables(conn)?.is_empty(),
        _ => true,
    };
    if stale {
        warn!(
            "Stored schema v{} does not match v{}, recreating database",
            version, SCHEMA_VERSION
        );
        drop_all_tables(conn)?;
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS family_trees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            root_member_id INTEGER REFERENCES family_members(id) ON DELETE SET NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS family_members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tree_id INTEGER NOT NULL REFERENCES family_trees(id) ON DELETE CASCADE,
            first_name TEXT NOT NULL,
            last_name TEXT,
            gender TEXT NOT NULL DEFAULT 'unknown',
            is_living INTEGER NOT NULL DEFAULT 1,
            generation INTEGER NOT NULL DEFAULT 0,
            birth_date TEXT,
            death_date TEXT,
            birth_place TEXT,
            death_place TEXT,
            biography TEXT,
            photo_path TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_members_tree ON family_members(tree_id);

        CREATE TABLE IF NOT EXISTS relationships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL REFERENCES family_members(id) ON DELETE CASCADE,
            related_member_id INTEGER NOT NULL REFERENCES family_members(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            start_date TEXT,
            start_place TEXT,
            notes TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_relationships_member ON relationships(member_id, kind);
        CREATE INDEX IF NOT EXISTS idx_relationships_related ON relationships(related_member_id);

        CREATE TABLE IF NOT EXISTS life_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL REFERENCES family_members(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            date TEXT,
            place TEXT,
            latitude REAL,
            longitude REAL,
            notes TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_life_events_member ON life_events(member_id);

        CREATE TABLE IF NOT EXISTS media (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL REFERENCES family_members(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            file_path TEXT NOT NULL,
            file_size INTEGER NOT NULL DEFAULT 0,
            mime_type TEXT,
            content_hash TEXT,
            title TEXT,
            description TEXT,
            date_taken TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_media_member ON media(member_id);
        CREATE INDEX IF NOT EXISTS idx_media_hash ON media(content_hash);",
    )?;

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Malformed stored dates read back as `None` instead of failing the row
pub(crate) fn date_from_sql(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

pub(crate) fn bool_to_sql(value: bool) -> i32 {
    if value { 1 } else { 0 }
}
