//! Tree Repository
//!
//! Handles all family-tree-level database operations.

use async_trait::async_trait;
use futures::stream::BoxStream;
use rusqlite::{params, OptionalExtension, Row};

use crate::domain::{FamilyTree, DomainError, DomainResult};
use super::db::{now_millis, DbState, Table};
use super::observe::observe;
use super::traits::Repository;

const TREE_COLUMNS: &str = "id, name, description, root_member_id, created_at, updated_at";

/// SQLite implementation of the FamilyTree repository
#[derive(Clone)]
pub struct TreeRepository {
    db: DbState,
}

impl TreeRepository {
    pub fn new(db: DbState) -> Self {
        Self { db }
    }

    /// Point the tree at the member generations are counted from
    ///
    /// The member must belong to the tree; `None` clears the root.
    pub async fn set_root_member(&self, tree_id: u32, member_id: Option<u32>) -> DomainResult<()> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        if let Some(member_id) = member_id {
            let owner: Option<u32> = conn
                .query_row(
                    "SELECT tree_id FROM family_members WHERE id = ?",
                    params![member_id],
                    |row| row.get(0),
                )
                .optional()?;
            match owner {
                Some(owner) if owner == tree_id => {}
                Some(_) => {
                    return Err(DomainError::InvalidInput(format!(
                        "Member {} does not belong to tree {}",
                        member_id, tree_id
                    )))
                }
                None => return Err(DomainError::NotFound(format!("Member {}", member_id))),
            }
        }

        let changed = conn.execute(
            "UPDATE family_trees SET root_member_id = ?, updated_at = ? WHERE id = ?",
            params![member_id, now_millis(), tree_id],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Tree {}", tree_id)));
        }

        drop(guard);
        self.db.notify(Table::Trees);
        Ok(())
    }

    /// Bump the last-touched timestamp
    pub async fn touch(&self, tree_id: u32) -> DomainResult<()> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        conn.execute(
            "UPDATE family_trees SET updated_at = ? WHERE id = ?",
            params![now_millis(), tree_id],
        )?;

        drop(guard);
        self.db.notify(Table::Trees);
        Ok(())
    }

    pub async fn count(&self) -> DomainResult<u32> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        Ok(conn.query_row("SELECT COUNT(*) FROM family_trees", [], |row| row.get(0))?)
    }

    /// All trees, most recently touched first, re-emitted on every change
    pub fn observe_all(&self) -> BoxStream<'static, DomainResult<Vec<FamilyTree>>> {
        let repo = self.clone();
        observe(&self.db, Table::Trees, move || {
            let repo = repo.clone();
            async move { repo.list().await }
        })
    }
}

#[async_trait]
impl Repository<FamilyTree> for TreeRepository {
    async fn create(&self, entity: &FamilyTree) -> DomainResult<FamilyTree> {
        if entity.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Tree name must not be empty".into()));
        }

        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let now = now_millis();
        conn.execute(
            "INSERT INTO family_trees (name, description, root_member_id, created_at, updated_at)
             VALUES (?, ?, NULL, ?, ?)",
            params![entity.name, entity.description, now, now],
        )?;

        let mut tree = entity.clone();
        tree.id = conn.last_insert_rowid() as u32;
        tree.root_member_id = None;
        tree.created_at = now;
        tree.updated_at = now;

        drop(guard);
        self.db.notify(Table::Trees);
        Ok(tree)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<FamilyTree>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let tree = conn
            .query_row(
                &format!("SELECT {} FROM family_trees WHERE id = ?", TREE_COLUMNS),
                params![id],
                row_to_tree,
            )
            .optional()?;
        Ok(tree)
    }

    async fn list(&self) -> DomainResult<Vec<FamilyTree>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM family_trees ORDER BY updated_at DESC, id DESC",
            TREE_COLUMNS
        ))?;
        let mut rows = stmt.query([])?;

        let mut trees = Vec::new();
        while let Some(row) = rows.next()? {
            trees.push(row_to_tree(row)?);
        }
        Ok(trees)
    }

    async fn update(&self, entity: &FamilyTree) -> DomainResult<FamilyTree> {
        if entity.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Tree name must not be empty".into()));
        }

        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let now = now_millis();
        let changed = conn.execute(
            "UPDATE family_trees SET name = ?, description = ?, updated_at = ? WHERE id = ?",
            params![entity.name, entity.description, now, entity.id],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Tree {}", entity.id)));
        }

        let stored = conn.query_row(
            &format!("SELECT {} FROM family_trees WHERE id = ?", TREE_COLUMNS),
            params![entity.id],
            row_to_tree,
        )?;

        drop(guard);
        self.db.notify(Table::Trees);
        Ok(stored)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        // Members, and everything hanging off them, go with the tree
        conn.execute("DELETE FROM family_trees WHERE id = ?", params![id])?;

        drop(guard);
        self.db.notify(Table::Trees);
        self.db.notify_all(&Table::MEMBER_CASCADE);
        Ok(())
    }
}

fn row_to_tree(row: &Row<'_>) -> rusqlite::Result<FamilyTree> {
    Ok(FamilyTree {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        root_member_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
