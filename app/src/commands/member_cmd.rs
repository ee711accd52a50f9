//! Commands for family members

use crate::domain::{FamilyMember, Gender};
use crate::repository::{Repository, SearchableRepository};
use crate::AppState;

/// Add a member to a tree
pub async fn create_member(
    state: &AppState,
    tree_id: u32,
    first_name: String,
    last_name: Option<String>,
    gender: Option<Gender>,
) -> Result<FamilyMember, String> {
    let mut member = FamilyMember::new(0, tree_id, first_name);
    member.last_name = last_name;
    member.gender = gender.unwrap_or_default();

    state.member_repo.create(&member).await.map_err(|e| e.to_string())
}

/// Replace every editable field of a member
pub async fn update_member(state: &AppState, member: FamilyMember) -> Result<FamilyMember, String> {
    state.member_repo.update(&member).await.map_err(|e| e.to_string())
}

pub async fn get_member(state: &AppState, id: u32) -> Result<Option<FamilyMember>, String> {
    state.member_repo.find_by_id(id).await.map_err(|e| e.to_string())
}

/// Members of a tree sorted by name
pub async fn list_members(state: &AppState, tree_id: u32) -> Result<Vec<FamilyMember>, String> {
    state.member_repo.list_by_tree(tree_id).await.map_err(|e| e.to_string())
}

pub async fn list_generation(
    state: &AppState,
    tree_id: u32,
    generation: i32,
) -> Result<Vec<FamilyMember>, String> {
    state
        .member_repo
        .list_by_generation(tree_id, generation)
        .await
        .map_err(|e| e.to_string())
}

/// Name search, within one tree or across all of them
pub async fn search_members(
    state: &AppState,
    tree_id: Option<u32>,
    query: String,
) -> Result<Vec<FamilyMember>, String> {
    let result = match tree_id {
        Some(id) => state.member_repo.search_in_tree(id, &query).await,
        None => state.member_repo.search(&query).await,
    };
    result.map_err(|e| e.to_string())
}

/// Remove a member with their relationships, events and media
pub async fn delete_member(state: &AppState, id: u32) -> Result<(), String> {
    state.member_repo.delete(id).await.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::commands::create_tree;
    use crate::commands::test_support::app_state;

    #[tokio::test]
    async fn test_member_edit_and_search() {
        let (state, _dir) = app_state().await;
        let tree = create_tree(&state, "Okafor".into(), None).await.unwrap();

        let mut chidi = create_member(&state, tree.id, "Chidi".into(), Some("Okafor".into()), Some(Gender::Male))
            .await
            .unwrap();
        create_member(&state, tree.id, "Ngozi".into(), Some("Okafor".into()), None).await.unwrap();

        chidi.birth_date = NaiveDate::from_ymd_opt(1961, 2, 14);
        chidi.generation = 1;
        let updated = update_member(&state, chidi.clone()).await.unwrap();
        assert_eq!(updated.birth_date, chidi.birth_date);

        let found = search_members(&state, Some(tree.id), "chi".into()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, chidi.id);

        assert_eq!(list_generation(&state, tree.id, 1).await.unwrap().len(), 1);
        assert_eq!(search_members(&state, None, "okafor".into()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (state, _dir) = app_state().await;
        let tree = create_tree(&state, "T".into(), None).await.unwrap();
        assert!(create_member(&state, tree.id, "   ".into(), None, None).await.is_err());
    }
}
