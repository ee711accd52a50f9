//! Family Member Entity
//!
//! A person inside exactly one family tree.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "male" => Gender::Male,
            "female" => Gender::Female,
            "other" => Gender::Other,
            _ => Gender::Unknown,
        }
    }
}

/// A member of a family tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    /// Unique identifier
    pub id: u32,
    /// Owning tree
    pub tree_id: u32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub gender: Gender,
    pub is_living: bool,
    /// Depth relative to the tree root (root = 0, parents = -1, children = 1)
    pub generation: i32,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub death_place: Option<String>,
    pub biography: Option<String>,
    /// Local path of the profile photo
    pub photo_path: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FamilyMember {
    /// Create a living member with unknown gender at generation 0
    pub fn new(id: u32, tree_id: u32, first_name: String) -> Self {
        Self {
            id,
            tree_id,
            first_name,
            last_name: None,
            gender: Gender::Unknown,
            is_living: true,
            generation: 0,
            birth_date: None,
            death_date: None,
            birth_place: None,
            death_place: None,
            biography: None,
            photo_path: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn display_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.trim().is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    /// Age in whole years at `on`, or at death for deceased members
    pub fn age_on(&self, on: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        let end = self.death_date.unwrap_or(on);
        end.years_since(birth)
    }
}

impl Entity for FamilyMember {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}
