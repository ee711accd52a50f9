//! Life event entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LifeEventKind {
    Birth,
    Death,
    Marriage,
    Divorce,
    Baptism,
    Education,
    Occupation,
    Residence,
    Immigration,
    Military,
    #[default]
    Other,
}

impl LifeEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifeEventKind::Birth => "birth",
            LifeEventKind::Death => "death",
            LifeEventKind::Marriage => "marriage",
            LifeEventKind::Divorce => "divorce",
            LifeEventKind::Baptism => "baptism",
            LifeEventKind::Education => "education",
            LifeEventKind::Occupation => "occupation",
            LifeEventKind::Residence => "residence",
            LifeEventKind::Immigration => "immigration",
            LifeEventKind::Military => "military",
            LifeEventKind::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "birth" => LifeEventKind::Birth,
            "death" => LifeEventKind::Death,
            "marriage" => LifeEventKind::Marriage,
            "divorce" => LifeEventKind::Divorce,
            "baptism" => LifeEventKind::Baptism,
            "education" => LifeEventKind::Education,
            "occupation" => LifeEventKind::Occupation,
            "residence" => LifeEventKind::Residence,
            "immigration" => LifeEventKind::Immigration,
            "military" => LifeEventKind::Military,
            _ => LifeEventKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeEvent {
    pub id: u32,
    pub member_id: u32,
    pub kind: LifeEventKind,
    pub date: Option<NaiveDate>,
    pub place: Option<String>,
    /// Set when the place was resolved through geocoding
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
}

impl LifeEvent {
    pub fn new(id: u32, member_id: u32, kind: LifeEventKind) -> Self {
        Self {
            id,
            member_id,
            kind,
            date: None,
            place: None,
            latitude: None,
            longitude: None,
            notes: None,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

impl Entity for LifeEvent {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        assert_eq!(LifeEventKind::Immigration.as_str(), "immigration");
        assert_eq!(LifeEventKind::from_str("marriage"), LifeEventKind::Marriage);
        assert_eq!(LifeEventKind::from_str("coronation"), LifeEventKind::Other);
    }

    #[test]
    fn test_coordinates_flag() {
        let mut event = LifeEvent::new(0, 1, LifeEventKind::Birth);
        assert!(!event.has_coordinates());
        event.latitude = Some(51.5);
        assert!(!event.has_coordinates());
        event.longitude = Some(-0.12);
        assert!(event.has_coordinates());
    }
}
