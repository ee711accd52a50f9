//! Relationship Repository - Core CRUD Operations
//!
//! SQLite-backed implementation for Relationship CRUD and reads.
//! Specialized operations are in separate modules:
//! - relationship_queries: derived ID sets, counts, existence checks
//! - relationship_batch: multi-record writes (batches, inverse pairs)

use async_trait::async_trait;
use futures::stream::BoxStream;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{Relationship, RelationshipKind, DomainError, DomainResult};
use super::super::db::{date_from_sql, date_to_sql, now_millis, DbState, Table};
use super::super::observe::observe;
use super::super::traits::Repository;

pub(super) const RELATIONSHIP_COLUMNS: &str =
    "id, member_id, related_member_id, kind, start_date, start_place, notes, created_at";

/// SQLite implementation of the Relationship repository
#[derive(Clone)]
pub struct RelationshipRepository {
    pub(super) db: DbState,
}

impl RelationshipRepository {
    pub fn new(db: DbState) -> Self {
        Self { db }
    }

    /// Every record owned by a member, ordered by kind then creation
    pub async fn get_relationships(&self, member_id: u32) -> DomainResult<Vec<Relationship>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_relationships(
            conn,
            &format!(
                "SELECT {} FROM relationships WHERE member_id = ? ORDER BY kind, id",
                RELATIONSHIP_COLUMNS
            ),
            params![member_id],
        )
    }

    pub fn observe_relationships(&self, member_id: u32) -> BoxStream<'static, DomainResult<Vec<Relationship>>> {
        let repo = self.clone();
        observe(&self.db, Table::Relationships, move || {
            let repo = repo.clone();
            async move { repo.get_relationships(member_id).await }
        })
    }

    pub async fn get_relationships_by_kind(
        &self,
        member_id: u32,
        kind: RelationshipKind,
    ) -> DomainResult<Vec<Relationship>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_relationships(
            conn,
            &format!(
                "SELECT {} FROM relationships WHERE member_id = ? AND kind = ? ORDER BY id",
                RELATIONSHIP_COLUMNS
            ),
            params![member_id, kind.as_str()],
        )
    }

    pub fn observe_relationships_by_kind(
        &self,
        member_id: u32,
        kind: RelationshipKind,
    ) -> BoxStream<'static, DomainResult<Vec<Relationship>>> {
        let repo = self.clone();
        observe(&self.db, Table::Relationships, move || {
            let repo = repo.clone();
            async move { repo.get_relationships_by_kind(member_id, kind).await }
        })
    }

    /// Records owned by other members that point at this member
    pub async fn get_related_to(&self, member_id: u32) -> DomainResult<Vec<Relationship>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_relationships(
            conn,
            &format!(
                "SELECT {} FROM relationships WHERE related_member_id = ? ORDER BY kind, id",
                RELATIONSHIP_COLUMNS
            ),
            params![member_id],
        )
    }
}

#[async_trait]
impl Repository<Relationship> for RelationshipRepository {
    /// Insert one directional record; no inverse record is created
    async fn create(&self, entity: &Relationship) -> DomainResult<Relationship> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let created = insert_relationship(conn, entity)?;

        drop(guard);
        self.db.notify(Table::Relationships);
        Ok(created)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Relationship>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let found = conn
            .query_row(
                &format!("SELECT {} FROM relationships WHERE id = ?", RELATIONSHIP_COLUMNS),
                params![id],
                row_to_relationship,
            )
            .optional()?;
        Ok(found)
    }

    async fn list(&self) -> DomainResult<Vec<Relationship>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_relationships(
            conn,
            &format!("SELECT {} FROM relationships ORDER BY member_id, kind, id", RELATIONSHIP_COLUMNS),
            [],
        )
    }

    async fn update(&self, entity: &Relationship) -> DomainResult<Relationship> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        validate_members(conn, entity)?;

        let changed = conn.execute(
            "UPDATE relationships SET member_id = ?, related_member_id = ?, kind = ?,
                start_date = ?, start_place = ?, notes = ?
             WHERE id = ?",
            params![
                entity.member_id,
                entity.related_member_id,
                entity.kind.as_str(),
                date_to_sql(entity.start_date),
                entity.start_place,
                entity.notes,
                entity.id
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Relationship {}", entity.id)));
        }

        let stored = conn.query_row(
            &format!("SELECT {} FROM relationships WHERE id = ?", RELATIONSHIP_COLUMNS),
            params![entity.id],
            row_to_relationship,
        )?;

        drop(guard);
        self.db.notify(Table::Relationships);
        Ok(stored)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        conn.execute("DELETE FROM relationships WHERE id = ?", params![id])?;

        drop(guard);
        self.db.notify(Table::Relationships);
        Ok(())
    }
}

/// Both ends must exist, differ, and live in the same tree
pub(super) fn validate_members(conn: &Connection, rel: &Relationship) -> DomainResult<()> {
    if rel.member_id == rel.related_member_id {
        return Err(DomainError::InvalidInput("A member cannot be related to itself".into()));
    }

    let tree_of = |id: u32| -> DomainResult<u32> {
        conn.query_row("SELECT tree_id FROM family_members WHERE id = ?", params![id], |row| row.get(0))
            .optional()?
            .ok_or_else(|| DomainError::NotFound(format!("Member {}", id)))
    };

    if tree_of(rel.member_id)? != tree_of(rel.related_member_id)? {
        return Err(DomainError::InvalidInput(
            "Related members belong to different trees".into(),
        ));
    }
    Ok(())
}

/// Validate and insert without notifying; callers own the notification
pub(super) fn insert_relationship(conn: &Connection, entity: &Relationship) -> DomainResult<Relationship> {
    validate_members(conn, entity)?;

    let now = now_millis();
    conn.execute(
        "INSERT INTO relationships (member_id, related_member_id, kind, start_date, start_place, notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            entity.member_id,
            entity.related_member_id,
            entity.kind.as_str(),
            date_to_sql(entity.start_date),
            entity.start_place,
            entity.notes,
            now
        ],
    )?;

    let mut created = entity.clone();
    created.id = conn.last_insert_rowid() as u32;
    created.created_at = now;
    Ok(created)
}

pub(super) fn query_relationships<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> DomainResult<Vec<Relationship>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;

    let mut relationships = Vec::new();
    while let Some(row) = rows.next()? {
        relationships.push(row_to_relationship(row)?);
    }
    Ok(relationships)
}

/// Convert a database row to Relationship
pub(super) fn row_to_relationship(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    let kind: String = row.get(3)?;
    let kind = RelationshipKind::from_str(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown relationship kind '{}'", kind).into(),
        )
    })?;

    Ok(Relationship {
        id: row.get(0)?,
        member_id: row.get(1)?,
        related_member_id: row.get(2)?,
        kind,
        start_date: date_from_sql(row.get(4)?),
        start_place: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}
