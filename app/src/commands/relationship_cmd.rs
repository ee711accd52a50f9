//! Commands for relationships between members

use serde::Serialize;

use crate::domain::{Relationship, RelationshipKind};
use crate::repository::{RelationshipBatchOperations, RelationshipQueryOperations, Repository};
use crate::AppState;

/// Related member IDs of one member, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FamilyIds {
    pub parents: Vec<u32>,
    pub children: Vec<u32>,
    pub spouses: Vec<u32>,
    pub ex_spouses: Vec<u32>,
    pub siblings: Vec<u32>,
}

/// Link two members
///
/// With `reciprocal` the inverse record (e.g. CHILD for PARENT) is written
/// in the same transaction. An identical existing record is an error.
pub async fn add_relationship(
    state: &AppState,
    member_id: u32,
    related_member_id: u32,
    kind: RelationshipKind,
    reciprocal: bool,
    notes: Option<String>,
) -> Result<Vec<Relationship>, String> {
    if member_id == related_member_id {
        return Err("A member cannot be related to itself".to_string());
    }

    let repo = &state.relationship_repo;
    let exists = repo
        .relationship_exists(member_id, related_member_id, kind)
        .await
        .map_err(|e| e.to_string())?;
    if exists {
        return Err(format!(
            "Relationship {} from {} to {} already exists",
            kind.as_str(),
            member_id,
            related_member_id
        ));
    }

    let mut relationship = Relationship::new(0, member_id, related_member_id, kind);
    relationship.notes = notes;

    if reciprocal {
        let inverse_exists = repo
            .relationship_exists(related_member_id, member_id, kind.inverse())
            .await
            .map_err(|e| e.to_string())?;
        if !inverse_exists {
            let (forward, inverse) = repo
                .insert_with_inverse(&relationship)
                .await
                .map_err(|e| e.to_string())?;
            return Ok(vec![forward, inverse]);
        }
    }

    let created = repo.create(&relationship).await.map_err(|e| e.to_string())?;
    Ok(vec![created])
}

/// Edit dates, place, notes or kind of a relationship
pub async fn update_relationship(state: &AppState, relationship: Relationship) -> Result<Relationship, String> {
    state
        .relationship_repo
        .update(&relationship)
        .await
        .map_err(|e| e.to_string())
}

pub async fn remove_relationship(state: &AppState, id: u32) -> Result<(), String> {
    state.relationship_repo.delete(id).await.map_err(|e| e.to_string())
}

/// Remove every link between two members, in both directions
pub async fn remove_relationships_between(
    state: &AppState,
    member_id: u32,
    related_member_id: u32,
) -> Result<usize, String> {
    state
        .relationship_repo
        .delete_between(member_id, related_member_id)
        .await
        .map_err(|e| e.to_string())
}

/// Relationships owned by a member, optionally of one kind
pub async fn list_relationships(
    state: &AppState,
    member_id: u32,
    kind: Option<RelationshipKind>,
) -> Result<Vec<Relationship>, String> {
    let repo = &state.relationship_repo;
    let result = match kind {
        Some(kind) => repo.get_relationships_by_kind(member_id, kind).await,
        None => repo.get_relationships(member_id).await,
    };
    result.map_err(|e| e.to_string())
}

pub async fn get_family_ids(state: &AppState, member_id: u32) -> Result<FamilyIds, String> {
    let repo = &state.relationship_repo;
    Ok(FamilyIds {
        parents: repo.get_parent_ids(member_id).await.map_err(|e| e.to_string())?,
        children: repo.get_child_ids(member_id).await.map_err(|e| e.to_string())?,
        spouses: repo.get_spouse_ids(member_id).await.map_err(|e| e.to_string())?,
        ex_spouses: repo.get_ex_spouse_ids(member_id).await.map_err(|e| e.to_string())?,
        siblings: repo.get_sibling_ids(member_id).await.map_err(|e| e.to_string())?,
    })
}

pub async fn count_relationships(state: &AppState, member_id: u32) -> Result<u32, String> {
    state
        .relationship_repo
        .count_for_member(member_id)
        .await
        .map_err(|e| e.to_string())
}
