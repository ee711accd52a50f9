//! Commands for family trees

use serde::Serialize;

use crate::domain::FamilyTree;
use crate::repository::Repository;
use crate::AppState;

/// A tree with its headline numbers
#[derive(Debug, Clone, Serialize)]
pub struct TreeSummary {
    pub tree: FamilyTree,
    pub member_count: u32,
    pub living_count: u32,
}

/// Create a new tree
pub async fn create_tree(
    state: &AppState,
    name: String,
    description: Option<String>,
) -> Result<FamilyTree, String> {
    let tree = match description {
        Some(d) => FamilyTree::with_description(0, name, d),
        None => FamilyTree::new(0, name),
    };
    state.tree_repo.create(&tree).await.map_err(|e| e.to_string())
}

/// All trees, most recently changed first
pub async fn list_trees(state: &AppState) -> Result<Vec<FamilyTree>, String> {
    state.tree_repo.list().await.map_err(|e| e.to_string())
}

pub async fn get_tree(state: &AppState, id: u32) -> Result<Option<FamilyTree>, String> {
    state.tree_repo.find_by_id(id).await.map_err(|e| e.to_string())
}

/// Trees with member counts, for the home screen
pub async fn list_tree_summaries(state: &AppState) -> Result<Vec<TreeSummary>, String> {
    let trees = state.tree_repo.list().await.map_err(|e| e.to_string())?;

    let mut summaries = Vec::with_capacity(trees.len());
    for tree in trees {
        let member_count = state.member_repo.count_by_tree(tree.id).await.map_err(|e| e.to_string())?;
        let living_count = state.member_repo.count_living(tree.id).await.map_err(|e| e.to_string())?;
        summaries.push(TreeSummary { tree, member_count, living_count });
    }
    Ok(summaries)
}

/// Rename a tree or change its description
pub async fn update_tree(
    state: &AppState,
    id: u32,
    name: Option<String>,
    description: Option<String>,
) -> Result<FamilyTree, String> {
    let existing = state.tree_repo.get(id).await.map_err(|e| e.to_string())?;

    let updated = FamilyTree {
        name: name.unwrap_or(existing.name),
        description: description.or(existing.description),
        ..existing
    };

    state.tree_repo.update(&updated).await.map_err(|e| e.to_string())
}

pub async fn set_root_member(
    state: &AppState,
    tree_id: u32,
    member_id: Option<u32>,
) -> Result<(), String> {
    state
        .tree_repo
        .set_root_member(tree_id, member_id)
        .await
        .map_err(|e| e.to_string())
}

/// Delete a tree with all of its members
pub async fn delete_tree(state: &AppState, id: u32) -> Result<(), String> {
    state.tree_repo.delete(id).await.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::app_state;
    use crate::commands::create_member;

    #[tokio::test]
    async fn test_tree_lifecycle() {
        let (state, _dir) = app_state().await;

        let tree = create_tree(&state, "Nakamura".into(), Some("Osaka branch".into()))
            .await
            .unwrap();
        let renamed = update_tree(&state, tree.id, Some("Nakamura family".into()), None)
            .await
            .unwrap();
        assert_eq!(renamed.name, "Nakamura family");
        assert_eq!(renamed.description.as_deref(), Some("Osaka branch"));

        create_member(&state, tree.id, "Haruto".into(), None, None).await.unwrap();
        let summaries = list_tree_summaries(&state).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].member_count, 1);
        assert_eq!(summaries[0].living_count, 1);

        delete_tree(&state, tree.id).await.unwrap();
        assert!(get_tree(&state, tree.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_tree() {
        let (state, _dir) = app_state().await;
        let err = update_tree(&state, 7, Some("x".into()), None).await.unwrap_err();
        assert!(err.contains("Not found"));
    }
}
