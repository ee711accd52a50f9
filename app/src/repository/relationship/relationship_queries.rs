//! Relationship Query Operations
//!
//! Derived views over a member's records: related-member ID sets per kind,
//! counts and the duplicate check callers run before inserting.

use async_trait::async_trait;
use rusqlite::params;

use crate::domain::{RelationshipKind, DomainError, DomainResult};

/// Trait for derived relationship lookups
#[async_trait]
pub trait RelationshipQueryOperations: Send + Sync {
    /// Related-member IDs of every `kind` record owned by `member_id`
    async fn get_related_ids(&self, member_id: u32, kind: RelationshipKind) -> DomainResult<Vec<u32>>;

    async fn get_parent_ids(&self, member_id: u32) -> DomainResult<Vec<u32>> {
        self.get_related_ids(member_id, RelationshipKind::Parent).await
    }

    async fn get_child_ids(&self, member_id: u32) -> DomainResult<Vec<u32>> {
        self.get_related_ids(member_id, RelationshipKind::Child).await
    }

    /// Current spouses only; former spouses are under `get_ex_spouse_ids`
    async fn get_spouse_ids(&self, member_id: u32) -> DomainResult<Vec<u32>> {
        self.get_related_ids(member_id, RelationshipKind::Spouse).await
    }

    async fn get_ex_spouse_ids(&self, member_id: u32) -> DomainResult<Vec<u32>> {
        self.get_related_ids(member_id, RelationshipKind::ExSpouse).await
    }

    async fn get_sibling_ids(&self, member_id: u32) -> DomainResult<Vec<u32>> {
        self.get_related_ids(member_id, RelationshipKind::Sibling).await
    }

    /// Whether the exact (member, related member, kind) record exists
    ///
    /// The repository never enforces uniqueness; callers check first.
    async fn relationship_exists(
        &self,
        member_id: u32,
        related_member_id: u32,
        kind: RelationshipKind,
    ) -> DomainResult<bool>;

    /// Records owned by a member
    async fn count_for_member(&self, member_id: u32) -> DomainResult<u32>;

    /// Records of one kind across the whole store
    async fn count_by_kind(&self, kind: RelationshipKind) -> DomainResult<u32>;
}

#[async_trait]
impl RelationshipQueryOperations for super::relationship_repo::RelationshipRepository {
    async fn get_related_ids(&self, member_id: u32, kind: RelationshipKind) -> DomainResult<Vec<u32>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let mut stmt = conn.prepare(
            "SELECT DISTINCT related_member_id FROM relationships
             WHERE member_id = ? AND kind = ?
             ORDER BY related_member_id",
        )?;
        let mut rows = stmt.query(params![member_id, kind.as_str()])?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get::<_, u32>(0)?);
        }
        Ok(ids)
    }

    async fn relationship_exists(
        &self,
        member_id: u32,
        related_member_id: u32,
        kind: RelationshipKind,
    ) -> DomainResult<bool> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM relationships
                WHERE member_id = ? AND related_member_id = ? AND kind = ?
            )",
            params![member_id, related_member_id, kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn count_for_member(&self, member_id: u32) -> DomainResult<u32> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        Ok(conn.query_row(
            "SELECT COUNT(*) FROM relationships WHERE member_id = ?",
            params![member_id],
            |row| row.get(0),
        )?)
    }

    async fn count_by_kind(&self, kind: RelationshipKind) -> DomainResult<u32> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        Ok(conn.query_row(
            "SELECT COUNT(*) FROM relationships WHERE kind = ?",
            params![kind.as_str()],
            |row| row.get(0),
        )?)
    }
}
