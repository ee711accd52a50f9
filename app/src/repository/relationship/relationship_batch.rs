//! Relationship Batch Operations
//!
//! Writes touching several records at once. Each call is one transaction:
//! either every record lands or none does.

use async_trait::async_trait;
use rusqlite::params;

use crate::domain::{Relationship, DomainError, DomainResult};
use super::super::db::Table;
use super::relationship_repo::insert_relationship;

/// Trait for multi-record relationship writes
#[async_trait]
pub trait RelationshipBatchOperations: Send + Sync {
    /// Insert all records, returning them with assigned IDs
    async fn insert_all(&self, relationships: &[Relationship]) -> DomainResult<Vec<Relationship>>;

    /// Insert a record together with the mirrored record on the other member
    ///
    /// Returns `(record, inverse)`.
    async fn insert_with_inverse(&self, relationship: &Relationship) -> DomainResult<(Relationship, Relationship)>;

    /// Remove every record the member owns or is the target of
    async fn delete_for_member(&self, member_id: u32) -> DomainResult<usize>;

    /// Remove records between two members, in both directions
    async fn delete_between(&self, member_id: u32, related_member_id: u32) -> DomainResult<usize>;
}

#[async_trait]
impl RelationshipBatchOperations for super::relationship_repo::RelationshipRepository {
    async fn insert_all(&self, relationships: &[Relationship]) -> DomainResult<Vec<Relationship>> {
        if relationships.is_empty() {
            return Ok(Vec::new());
        }

        let mut guard = self.db.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(DomainError::not_initialized)?;

        let tx = conn.transaction()?;
        let mut created = Vec::with_capacity(relationships.len());
        for rel in relationships {
            created.push(insert_relationship(&tx, rel)?);
        }
        tx.commit()?;

        drop(guard);
        self.db.notify(Table::Relationships);
        Ok(created)
    }

    async fn insert_with_inverse(&self, relationship: &Relationship) -> DomainResult<(Relationship, Relationship)> {
        let mut guard = self.db.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(DomainError::not_initialized)?;

        let tx = conn.transaction()?;
        let forward = insert_relationship(&tx, relationship)?;
        let inverse = insert_relationship(&tx, &relationship.inverse())?;
        tx.commit()?;

        drop(guard);
        self.db.notify(Table::Relationships);
        Ok((forward, inverse))
    }

    async fn delete_for_member(&self, member_id: u32) -> DomainResult<usize> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let removed = conn.execute(
            "DELETE FROM relationships WHERE member_id = ?1 OR related_member_id = ?1",
            params![member_id],
        )?;

        drop(guard);
        if removed > 0 {
            self.db.notify(Table::Relationships);
        }
        Ok(removed)
    }

    async fn delete_between(&self, member_id: u32, related_member_id: u32) -> DomainResult<usize> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let removed = conn.execute(
            "DELETE FROM relationships
             WHERE (member_id = ?1 AND related_member_id = ?2)
                OR (member_id = ?2 AND related_member_id = ?1)",
            params![member_id, related_member_id],
        )?;

        drop(guard);
        if removed > 0 {
            self.db.notify(Table::Relationships);
        }
        Ok(removed)
    }
}
