//! Family tree domain entity

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// A family tree groups members into one isolated genealogy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyTree {
    pub id: u32,
    pub name: String,
    pub description: Option<String>,
    /// Member the generations are counted from
    pub root_member_id: Option<u32>,
    pub created_at: i64,
    /// Last time the tree or one of its members changed (ms)
    pub updated_at: i64,
}

impl Entity for FamilyTree {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl FamilyTree {
    pub fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            description: None,
            root_member_id: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn with_description(id: u32, name: String, description: String) -> Self {
        Self {
            description: Some(description),
            ..Self::new(id, name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_creation() {
        let tree = FamilyTree::new(1, "Smith".to_string());
        assert_eq!(tree.id(), 1);
        assert!(tree.description.is_none());
        assert!(tree.root_member_id.is_none());
    }

    #[test]
    fn test_tree_with_description() {
        let tree = FamilyTree::with_description(0, "Li".to_string(), "Paternal line".to_string());
        assert_eq!(tree.description.as_deref(), Some("Paternal line"));
    }
}
