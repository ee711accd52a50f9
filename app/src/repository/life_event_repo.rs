//! Life Event Repository
//!
//! Births, marriages, moves and other dated events per member.

use async_trait::async_trait;
use futures::stream::BoxStream;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{LifeEvent, LifeEventKind, DomainError, DomainResult};
use super::db::{date_from_sql, date_to_sql, DbState, Table};
use super::observe::observe;
use super::traits::Repository;

const EVENT_COLUMNS: &str = "id, member_id, kind, date, place, latitude, longitude, notes";

// Undated events sort after dated ones
const EVENT_ORDER: &str = "ORDER BY date IS NULL, date, id";

#[derive(Clone)]
pub struct LifeEventRepository {
    db: DbState,
}

impl LifeEventRepository {
    pub fn new(db: DbState) -> Self {
        Self { db }
    }

    /// Events of a member in chronological order
    pub async fn list_for_member(&self, member_id: u32) -> DomainResult<Vec<LifeEvent>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_events(
            conn,
            &format!("SELECT {} FROM life_events WHERE member_id = ? {}", EVENT_COLUMNS, EVENT_ORDER),
            params![member_id],
        )
    }

    pub fn observe_for_member(&self, member_id: u32) -> BoxStream<'static, DomainResult<Vec<LifeEvent>>> {
        let repo = self.clone();
        observe(&self.db, Table::LifeEvents, move || {
            let repo = repo.clone();
            async move { repo.list_for_member(member_id).await }
        })
    }

    pub async fn list_by_kind(&self, member_id: u32, kind: LifeEventKind) -> DomainResult<Vec<LifeEvent>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_events(
            conn,
            &format!(
                "SELECT {} FROM life_events WHERE member_id = ? AND kind = ? {}",
                EVENT_COLUMNS, EVENT_ORDER
            ),
            params![member_id, kind.as_str()],
        )
    }

    pub async fn delete_for_member(&self, member_id: u32) -> DomainResult<usize> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let removed = conn.execute("DELETE FROM life_events WHERE member_id = ?", params![member_id])?;

        drop(guard);
        self.db.notify(Table::LifeEvents);
        Ok(removed)
    }
}

#[async_trait]
impl Repository<LifeEvent> for LifeEventRepository {
    async fn create(&self, entity: &LifeEvent) -> DomainResult<LifeEvent> {
        validate(entity)?;

        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        conn.execute(
            "INSERT INTO life_events (member_id, kind, date, place, latitude, longitude, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.member_id,
                entity.kind.as_str(),
                date_to_sql(entity.date),
                entity.place,
                entity.latitude,
                entity.longitude,
                entity.notes
            ],
        )
        .map_err(|e| member_fk_error(e, entity.member_id))?;

        let mut event = entity.clone();
        event.id = conn.last_insert_rowid() as u32;

        drop(guard);
        self.db.notify(Table::LifeEvents);
        Ok(event)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<LifeEvent>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let event = conn
            .query_row(
                &format!("SELECT {} FROM life_events WHERE id = ?", EVENT_COLUMNS),
                params![id],
                row_to_event,
            )
            .optional()?;
        Ok(event)
    }

    async fn list(&self) -> DomainResult<Vec<LifeEvent>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_events(
            conn,
            &format!("SELECT {} FROM life_events ORDER BY member_id, date IS NULL, date, id", EVENT_COLUMNS),
            [],
        )
    }

    async fn update(&self, entity: &LifeEvent) -> DomainResult<LifeEvent> {
        validate(entity)?;

        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let changed = conn.execute(
            "UPDATE life_events SET kind = ?, date = ?, place = ?, latitude = ?, longitude = ?, notes = ?
             WHERE id = ?",
            params![
                entity.kind.as_str(),
                date_to_sql(entity.date),
                entity.place,
                entity.latitude,
                entity.longitude,
                entity.notes,
                entity.id
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Life event {}", entity.id)));
        }

        let stored = conn.query_row(
            &format!("SELECT {} FROM life_events WHERE id = ?", EVENT_COLUMNS),
            params![entity.id],
            row_to_event,
        )?;

        drop(guard);
        self.db.notify(Table::LifeEvents);
        Ok(stored)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        conn.execute("DELETE FROM life_events WHERE id = ?", params![id])?;

        drop(guard);
        self.db.notify(Table::LifeEvents);
        Ok(())
    }
}

fn validate(event: &LifeEvent) -> DomainResult<()> {
    if event.latitude.is_some() != event.longitude.is_some() {
        return Err(DomainError::InvalidInput(
            "Latitude and longitude must be set together".into(),
        ));
    }
    if let (Some(lat), Some(lon)) = (event.latitude, event.longitude) {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(DomainError::InvalidInput(format!(
                "Coordinates out of range: {}, {}",
                lat, lon
            )));
        }
    }
    Ok(())
}

/// Translate a foreign-key violation on insert into NotFound
pub(crate) fn member_fk_error(err: rusqlite::Error, member_id: u32) -> DomainError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            DomainError::NotFound(format!("Member {}", member_id))
        }
        other => DomainError::Database(other),
    }
}

fn query_events<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> DomainResult<Vec<LifeEvent>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;

    let mut events = Vec::new();
    while let Some(row) = rows.next()? {
        events.push(row_to_event(row)?);
    }
    Ok(events)
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<LifeEvent> {
    Ok(LifeEvent {
        id: row.get(0)?,
        member_id: row.get(1)?,
        kind: LifeEventKind::from_str(&row.get::<_, String>(2)?),
        date: date_from_sql(row.get(3)?),
        place: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        notes: row.get(7)?,
    })
}
