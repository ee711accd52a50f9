//! Media Repository
//!
//! Photos and documents attached to members. Files stay where they are;
//! only the path, size, type and content hash are stored.

use std::path::PathBuf;

use async_trait::async_trait;
use futures::stream::BoxStream;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{FileIdentifier, Media, MediaKind, DomainError, DomainResult};
use super::db::{date_from_sql, date_to_sql, now_millis, DbState, Table};
use super::life_event_repo::member_fk_error;
use super::observe::observe;
use super::traits::Repository;

const MEDIA_COLUMNS: &str = "id, member_id, kind, file_path, file_size, mime_type, content_hash, \
     title, description, date_taken, created_at";

#[derive(Clone)]
pub struct MediaRepository {
    db: DbState,
}

impl MediaRepository {
    pub fn new(db: DbState) -> Self {
        Self { db }
    }

    /// Register a file on disk as media of `member_id`
    ///
    /// Kind, size, MIME type and content hash are read from the file.
    pub async fn attach_file(&self, member_id: u32, path: PathBuf) -> DomainResult<Media> {
        let fingerprint_path = path.clone();
        let fingerprint = tokio::task::spawn_blocking(move || FileIdentifier::fingerprint(&fingerprint_path))
            .await
            .map_err(|e| DomainError::Internal(format!("Fingerprint task failed: {}", e)))??;

        let mut media = Media::new(
            0,
            member_id,
            fingerprint.kind,
            path.to_string_lossy().to_string(),
            fingerprint.size,
        );
        media.mime_type = fingerprint.mime_type;
        media.content_hash = Some(fingerprint.content_hash);
        media.title = path.file_stem().map(|s| s.to_string_lossy().to_string());

        self.create(&media).await
    }

    pub async fn list_for_member(&self, member_id: u32) -> DomainResult<Vec<Media>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_media(
            conn,
            &format!("SELECT {} FROM media WHERE member_id = ? ORDER BY created_at, id", MEDIA_COLUMNS),
            params![member_id],
        )
    }

    pub fn observe_for_member(&self, member_id: u32) -> BoxStream<'static, DomainResult<Vec<Media>>> {
        let repo = self.clone();
        observe(&self.db, Table::Media, move || {
            let repo = repo.clone();
            async move { repo.list_for_member(member_id).await }
        })
    }

    pub async fn list_by_kind(&self, member_id: u32, kind: MediaKind) -> DomainResult<Vec<Media>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_media(
            conn,
            &format!(
                "SELECT {} FROM media WHERE member_id = ? AND kind = ? ORDER BY created_at, id",
                MEDIA_COLUMNS
            ),
            params![member_id, kind.as_str()],
        )
    }

    /// Sum of attached file sizes in bytes
    pub async fn total_size_for_member(&self, member_id: u32) -> DomainResult<u64> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(file_size), 0) FROM media WHERE member_id = ?",
            params![member_id],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    /// Every media record with this content, across all members
    pub async fn find_by_content_hash(&self, content_hash: &str) -> DomainResult<Vec<Media>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_media(
            conn,
            &format!("SELECT {} FROM media WHERE content_hash = ? ORDER BY id", MEDIA_COLUMNS),
            params![content_hash],
        )
    }
}

#[async_trait]
impl Repository<Media> for MediaRepository {
    async fn create(&self, entity: &Media) -> DomainResult<Media> {
        if entity.file_path.trim().is_empty() {
            return Err(DomainError::InvalidInput("Media file path must not be empty".into()));
        }

        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let now = now_millis();
        conn.execute(
            "INSERT INTO media (member_id, kind, file_path, file_size, mime_type, content_hash,
                title, description, date_taken, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.member_id,
                entity.kind.as_str(),
                entity.file_path,
                entity.file_size as i64,
                entity.mime_type,
                entity.content_hash,
                entity.title,
                entity.description,
                date_to_sql(entity.date_taken),
                now
            ],
        )
        .map_err(|e| member_fk_error(e, entity.member_id))?;

        let mut media = entity.clone();
        media.id = conn.last_insert_rowid() as u32;
        media.created_at = now;

        drop(guard);
        self.db.notify(Table::Media);
        Ok(media)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Media>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let media = conn
            .query_row(
                &format!("SELECT {} FROM media WHERE id = ?", MEDIA_COLUMNS),
                params![id],
                row_to_media,
            )
            .optional()?;
        Ok(media)
    }

    async fn list(&self) -> DomainResult<Vec<Media>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_media(
            conn,
            &format!("SELECT {} FROM media ORDER BY member_id, id", MEDIA_COLUMNS),
            [],
        )
    }

    /// Updates descriptive fields; path, size and hash describe the file and stay
    async fn update(&self, entity: &Media) -> DomainResult<Media> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let changed = conn.execute(
            "UPDATE media SET kind = ?, title = ?, description = ?, date_taken = ? WHERE id = ?",
            params![
                entity.kind.as_str(),
                entity.title,
                entity.description,
                date_to_sql(entity.date_taken),
                entity.id
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Media {}", entity.id)));
        }

        let stored = conn.query_row(
            &format!("SELECT {} FROM media WHERE id = ?", MEDIA_COLUMNS),
            params![entity.id],
            row_to_media,
        )?;

        drop(guard);
        self.db.notify(Table::Media);
        Ok(stored)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        conn.execute("DELETE FROM media WHERE id = ?", params![id])?;

        drop(guard);
        self.db.notify(Table::Media);
        Ok(())
    }
}

fn query_media<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> DomainResult<Vec<Media>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;

    let mut media = Vec::new();
    while let Some(row) = rows.next()? {
        media.push(row_to_media(row)?);
    }
    Ok(media)
}

fn row_to_media(row: &Row<'_>) -> rusqlite::Result<Media> {
    Ok(Media {
        id: row.get(0)?,
        member_id: row.get(1)?,
        kind: MediaKind::from_str(&row.get::<_, String>(2)?),
        file_path: row.get(3)?,
        file_size: row.get::<_, i64>(4)?.max(0) as u64,
        mime_type: row.get(5)?,
        content_hash: row.get(6)?,
        title: row.get(7)?,
        description: row.get(8)?,
        date_taken: date_from_sql(row.get(9)?),
        created_at: row.get(10)?,
    })
}
