//! Relationship Entity
//!
//! Directional link between two members of the same tree:
//! "`member_id`'s `kind` is `related_member_id`".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Parent,
    Child,
    Spouse,
    ExSpouse,
    Sibling,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 5] = [
        RelationshipKind::Parent,
        RelationshipKind::Child,
        RelationshipKind::Spouse,
        RelationshipKind::ExSpouse,
        RelationshipKind::Sibling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Parent => "parent",
            RelationshipKind::Child => "child",
            RelationshipKind::Spouse => "spouse",
            RelationshipKind::ExSpouse => "ex_spouse",
            RelationshipKind::Sibling => "sibling",
        }
    }

    /// Unlike the other enums there is no safe fallback kind
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "parent" => Some(RelationshipKind::Parent),
            "child" => Some(RelationshipKind::Child),
            "spouse" => Some(RelationshipKind::Spouse),
            "ex_spouse" => Some(RelationshipKind::ExSpouse),
            "sibling" => Some(RelationshipKind::Sibling),
            _ => None,
        }
    }

    /// Kind of the mirrored record seen from the related member
    pub fn inverse(&self) -> Self {
        match self {
            RelationshipKind::Parent => RelationshipKind::Child,
            RelationshipKind::Child => RelationshipKind::Parent,
            other => *other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: u32,
    pub member_id: u32,
    pub related_member_id: u32,
    pub kind: RelationshipKind,
    pub start_date: Option<NaiveDate>,
    pub start_place: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
}

impl Relationship {
    pub fn new(id: u32, member_id: u32, related_member_id: u32, kind: RelationshipKind) -> Self {
        Self {
            id,
            member_id,
            related_member_id,
            kind,
            start_date: None,
            start_place: None,
            notes: None,
            created_at: 0,
        }
    }

    /// The same link recorded from the other member's side
    ///
    /// Dates, place and notes are shared; the ID is left unassigned.
    pub fn inverse(&self) -> Self {
        Self {
            id: 0,
            member_id: self.related_member_id,
            related_member_id: self.member_id,
            kind: self.kind.inverse(),
            start_date: self.start_date,
            start_place: self.start_place.clone(),
            notes: self.notes.clone(),
            created_at: self.created_at,
        }
    }
}

impl Entity for Relationship {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip_names() {
        for kind in RelationshipKind::ALL {
            assert_eq!(RelationshipKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(RelationshipKind::from_str("cousin"), None);
    }

    #[test]
    fn test_inverse_kind() {
        assert_eq!(RelationshipKind::Parent.inverse(), RelationshipKind::Child);
        assert_eq!(RelationshipKind::Child.inverse(), RelationshipKind::Parent);
        assert_eq!(RelationshipKind::Spouse.inverse(), RelationshipKind::Spouse);
        assert_eq!(RelationshipKind::Sibling.inverse(), RelationshipKind::Sibling);
    }

    #[test]
    fn test_inverse_record() {
        let mut rel = Relationship::new(5, 1, 2, RelationshipKind::Parent);
        rel.notes = Some("adoptive".to_string());

        let inverse = rel.inverse();
        assert_eq!(inverse.id, 0);
        assert_eq!(inverse.member_id, 2);
        assert_eq!(inverse.related_member_id, 1);
        assert_eq!(inverse.kind, RelationshipKind::Child);
        assert_eq!(inverse.notes.as_deref(), Some("adoptive"));
    }

    #[test]
    fn test_serde_kind_name() {
        let json = serde_json::to_string(&RelationshipKind::ExSpouse).unwrap();
        assert_eq!(json, "\"ex_spouse\"");
    }
}
