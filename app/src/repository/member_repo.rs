//! Member Repository
//!
//! SQLite-backed CRUD and lookups for family members. Every write also
//! touches the owning tree so tree lists stay ordered by activity.

use async_trait::async_trait;
use futures::stream::BoxStream;
use pinyin::ToPinyin;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{FamilyMember, Gender, DomainError, DomainResult};
use super::db::{bool_to_sql, date_from_sql, date_to_sql, now_millis, DbState, Table};
use super::observe::observe;
use super::traits::{Repository, SearchableRepository};

const MEMBER_COLUMNS: &str = "id, tree_id, first_name, last_name, gender, is_living, generation, \
     birth_date, death_date, birth_place, death_place, biography, photo_path, created_at, updated_at";

/// SQLite implementation of the FamilyMember repository
#[derive(Clone)]
pub struct MemberRepository {
    db: DbState,
}

impl MemberRepository {
    pub fn new(db: DbState) -> Self {
        Self { db }
    }

    /// Members of a tree, sorted by surname then given name (pinyin-aware)
    pub async fn list_by_tree(&self, tree_id: u32) -> DomainResult<Vec<FamilyMember>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let mut members = query_members(
            conn,
            &format!("SELECT {} FROM family_members WHERE tree_id = ?", MEMBER_COLUMNS),
            params![tree_id],
        )?;
        sort_by_name(&mut members);
        Ok(members)
    }

    pub fn observe_by_tree(&self, tree_id: u32) -> BoxStream<'static, DomainResult<Vec<FamilyMember>>> {
        let repo = self.clone();
        observe(&self.db, Table::Members, move || {
            let repo = repo.clone();
            async move { repo.list_by_tree(tree_id).await }
        })
    }

    /// Case-insensitive substring match on first or last name within one tree
    pub async fn search_in_tree(&self, tree_id: u32, query: &str) -> DomainResult<Vec<FamilyMember>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_by_tree(tree_id).await;
        }

        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let needle = fold_case(query);
        let mut members = query_members(
            conn,
            &format!("SELECT {} FROM family_members WHERE tree_id = ?", MEMBER_COLUMNS),
            params![tree_id],
        )?;
        members.retain(|m| name_matches(m, &needle));
        sort_by_name(&mut members);
        Ok(members)
    }

    pub async fn list_by_generation(&self, tree_id: u32, generation: i32) -> DomainResult<Vec<FamilyMember>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let mut members = query_members(
            conn,
            &format!(
                "SELECT {} FROM family_members WHERE tree_id = ? AND generation = ?",
                MEMBER_COLUMNS
            ),
            params![tree_id, generation],
        )?;
        sort_by_name(&mut members);
        Ok(members)
    }

    pub async fn count_by_tree(&self, tree_id: u32) -> DomainResult<u32> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM family_members WHERE tree_id = ?",
            params![tree_id],
            |row| row.get(0),
        )?)
    }

    pub async fn count_living(&self, tree_id: u32) -> DomainResult<u32> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM family_members WHERE tree_id = ? AND is_living = 1",
            params![tree_id],
            |row| row.get(0),
        )?)
    }
}

#[async_trait]
impl Repository<FamilyMember> for MemberRepository {
    async fn create(&self, entity: &FamilyMember) -> DomainResult<FamilyMember> {
        validate(entity)?;

        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let tree_exists = conn
            .query_row("SELECT 1 FROM family_trees WHERE id = ?", params![entity.tree_id], |_| Ok(()))
            .optional()?
            .is_some();
        if !tree_exists {
            return Err(DomainError::NotFound(format!("Tree {}", entity.tree_id)));
        }

        let now = now_millis();
        conn.execute(
            "INSERT INTO family_members (tree_id, first_name, last_name, gender, is_living, generation,
                birth_date, death_date, birth_place, death_place, biography, photo_path, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.tree_id,
                entity.first_name,
                entity.last_name,
                entity.gender.as_str(),
                bool_to_sql(entity.is_living),
                entity.generation,
                date_to_sql(entity.birth_date),
                date_to_sql(entity.death_date),
                entity.birth_place,
                entity.death_place,
                entity.biography,
                entity.photo_path,
                now,
                now
            ],
        )?;

        let mut member = entity.clone();
        member.id = conn.last_insert_rowid() as u32;
        member.created_at = now;
        member.updated_at = now;

        touch_tree(conn, entity.tree_id, now)?;

        drop(guard);
        self.db.notify_all(&[Table::Members, Table::Trees]);
        Ok(member)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<FamilyMember>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let member = conn
            .query_row(
                &format!("SELECT {} FROM family_members WHERE id = ?", MEMBER_COLUMNS),
                params![id],
                row_to_member,
            )
            .optional()?;
        Ok(member)
    }

    async fn list(&self) -> DomainResult<Vec<FamilyMember>> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        query_members(
            conn,
            &format!("SELECT {} FROM family_members ORDER BY tree_id, id", MEMBER_COLUMNS),
            [],
        )
    }

    async fn update(&self, entity: &FamilyMember) -> DomainResult<FamilyMember> {
        validate(entity)?;

        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        // Moving a member between trees is not supported; tree_id is left as stored
        let now = now_millis();
        let changed = conn.execute(
            "UPDATE family_members SET first_name = ?, last_name = ?, gender = ?, is_living = ?, generation = ?,
                birth_date = ?, death_date = ?, birth_place = ?, death_place = ?, biography = ?, photo_path = ?,
                updated_at = ?
             WHERE id = ?",
            params![
                entity.first_name,
                entity.last_name,
                entity.gender.as_str(),
                bool_to_sql(entity.is_living),
                entity.generation,
                date_to_sql(entity.birth_date),
                date_to_sql(entity.death_date),
                entity.birth_place,
                entity.death_place,
                entity.biography,
                entity.photo_path,
                now,
                entity.id
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Member {}", entity.id)));
        }

        let stored = conn.query_row(
            &format!("SELECT {} FROM family_members WHERE id = ?", MEMBER_COLUMNS),
            params![entity.id],
            row_to_member,
        )?;
        touch_tree(conn, stored.tree_id, now)?;

        drop(guard);
        self.db.notify_all(&[Table::Members, Table::Trees]);
        Ok(stored)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let tree_id: Option<u32> = conn
            .query_row("SELECT tree_id FROM family_members WHERE id = ?", params![id], |row| row.get(0))
            .optional()?;
        let Some(tree_id) = tree_id else {
            return Ok(());
        };

        // Relationships on both sides, life events and media cascade
        conn.execute("DELETE FROM family_members WHERE id = ?", params![id])?;
        touch_tree(conn, tree_id, now_millis())?;

        drop(guard);
        self.db.notify_all(&Table::MEMBER_CASCADE);
        self.db.notify(Table::Trees);
        Ok(())
    }
}

#[async_trait]
impl SearchableRepository<FamilyMember> for MemberRepository {
    /// Name search across every tree
    async fn search(&self, query: &str) -> DomainResult<Vec<FamilyMember>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let guard = self.db.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let needle = fold_case(query);
        let mut members = query_members(
            conn,
            &format!("SELECT {} FROM family_members", MEMBER_COLUMNS),
            [],
        )?;
        members.retain(|m| name_matches(m, &needle));
        sort_by_name(&mut members);
        Ok(members)
    }
}

fn validate(member: &FamilyMember) -> DomainResult<()> {
    if member.first_name.trim().is_empty() {
        return Err(DomainError::InvalidInput("First name must not be empty".into()));
    }
    if let (Some(birth), Some(death)) = (member.birth_date, member.death_date) {
        if death < birth {
            return Err(DomainError::InvalidInput("Death date is before birth date".into()));
        }
    }
    Ok(())
}

fn touch_tree(conn: &Connection, tree_id: u32, now: i64) -> DomainResult<()> {
    conn.execute(
        "UPDATE family_trees SET updated_at = ? WHERE id = ?",
        params![now, tree_id],
    )?;
    Ok(())
}

fn query_members<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> DomainResult<Vec<FamilyMember>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;

    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        members.push(row_to_member(row)?);
    }
    Ok(members)
}

/// Unicode lowercase, so "ÉMILE" and "émile" compare equal
fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Substring match of an already folded needle on first or last name
fn name_matches(member: &FamilyMember, needle: &str) -> bool {
    fold_case(&member.first_name).contains(needle)
        || member
            .last_name
            .as_deref()
            .is_some_and(|last| fold_case(last).contains(needle))
}

/// Sort key that orders Chinese names by pinyin and Latin names case-insensitively
pub(crate) fn name_sort_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.chars() {
        match c.to_pinyin() {
            Some(p) => key.push_str(p.plain()),
            None => key.extend(c.to_lowercase()),
        }
    }
    key
}

fn sort_by_name(members: &mut [FamilyMember]) {
    members.sort_by_cached_key(|m| {
        (
            name_sort_key(m.last_name.as_deref().unwrap_or("")),
            name_sort_key(&m.first_name),
            m.id,
        )
    });
}

fn row_to_member(row: &Row<'_>) -> rusqlite::Result<FamilyMember> {
    Ok(FamilyMember {
        id: row.get(0)?,
        tree_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        gender: Gender::from_str(&row.get::<_, String>(4)?),
        is_living: row.get::<_, i32>(5)? != 0,
        generation: row.get(6)?,
        birth_date: date_from_sql(row.get(7)?),
        death_date: date_from_sql(row.get(8)?),
        birth_place: row.get(9)?,
        death_place: row.get(10)?,
        biography: row.get(11)?,
        photo_path: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_case_handles_accents() {
        assert_eq!(fold_case("ÉMILE Ängström"), "émile ängström");

        let mut m = FamilyMember::new(1, 1, "Émile".to_string());
        m.last_name = Some("Durkheim".to_string());
        assert!(name_matches(&m, "émile"));
        assert!(name_matches(&m, "rkh"));
        assert!(!name_matches(&m, "%"));
    }

    #[test]
    fn test_name_sort_key() {
        assert_eq!(name_sort_key("Zhang"), "zhang");
        assert_eq!(name_sort_key("张"), "zhang");
        assert!(name_sort_key("李") < name_sort_key("王"));
    }
}
