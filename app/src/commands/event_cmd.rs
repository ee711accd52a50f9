//! Commands for life events

use crate::domain::{LifeEvent, LifeEventKind};
use crate::repository::Repository;
use crate::AppState;

pub async fn add_life_event(state: &AppState, event: LifeEvent) -> Result<LifeEvent, String> {
    state.life_event_repo.create(&event).await.map_err(|e| e.to_string())
}

pub async fn update_life_event(state: &AppState, event: LifeEvent) -> Result<LifeEvent, String> {
    state.life_event_repo.update(&event).await.map_err(|e| e.to_string())
}

/// A member's events in chronological order, optionally of one kind
pub async fn list_life_events(
    state: &AppState,
    member_id: u32,
    kind: Option<LifeEventKind>,
) -> Result<Vec<LifeEvent>, String> {
    let repo = &state.life_event_repo;
    let result = match kind {
        Some(kind) => repo.list_by_kind(member_id, kind).await,
        None => repo.list_for_member(member_id).await,
    };
    result.map_err(|e| e.to_string())
}

pub async fn delete_life_event(state: &AppState, id: u32) -> Result<(), String> {
    state.life_event_repo.delete(id).await.map_err(|e| e.to_string())
}

/// Fill in the coordinates of an event from its place name
///
/// Returns the event unchanged when it has no place or nothing matched.
pub async fn locate_life_event(state: &AppState, id: u32) -> Result<LifeEvent, String> {
    let mut event = state.life_event_repo.get(id).await.map_err(|e| e.to_string())?;

    let Some(place) = event.place.clone() else {
        return Ok(event);
    };

    let results = state
        .geocoder
        .search_with_limit(&place, 1)
        .await
        .map_err(|e| e.to_string())?;
    let Some(best) = results.into_iter().next() else {
        return Ok(event);
    };

    event.latitude = Some(best.latitude);
    event.longitude = Some(best.longitude);
    state.life_event_repo.update(&event).await.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::commands::test_support::{app_state, app_state_with};
    use crate::commands::{create_member, create_tree};
    use crate::config::AppConfig;

    async fn member_id(state: &AppState) -> u32 {
        let tree = create_tree(state, "Events".into(), None).await.unwrap();
        create_member(state, tree.id, "Ada".into(), None, None).await.unwrap().id
    }

    #[tokio::test]
    async fn test_event_crud() {
        let (state, _dir) = app_state().await;
        let member = member_id(&state).await;

        let mut birth = LifeEvent::new(0, member, LifeEventKind::Birth);
        birth.date = NaiveDate::from_ymd_opt(1815, 12, 10);
        let birth = add_life_event(&state, birth).await.unwrap();

        let mut marriage = LifeEvent::new(0, member, LifeEventKind::Marriage);
        marriage.date = NaiveDate::from_ymd_opt(1835, 7, 8);
        add_life_event(&state, marriage).await.unwrap();

        assert_eq!(list_life_events(&state, member, None).await.unwrap().len(), 2);
        let births = list_life_events(&state, member, Some(LifeEventKind::Birth)).await.unwrap();
        assert_eq!(births, vec![birth.clone()]);

        let mut edited = birth.clone();
        edited.place = Some("London".into());
        assert_eq!(update_life_event(&state, edited).await.unwrap().place.as_deref(), Some("London"));

        delete_life_event(&state, birth.id).await.unwrap();
        assert_eq!(list_life_events(&state, member, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_locate_life_event_from_place() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .and(query_param("q", "Marylebone, London"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "features": [{
                    "geometry": { "coordinates": [-0.1488, 51.5225] },
                    "properties": { "name": "Marylebone" }
                }]
            })))
            .mount(&server)
            .await;

        let mut config = AppConfig::default();
        config.geocoding.photon_base_url = server.uri();
        config.geocoding.nominatim_base_url = server.uri();
        let (state, _dir) = app_state_with(config).await;
        let member = member_id(&state).await;

        let mut event = LifeEvent::new(0, member, LifeEventKind::Residence);
        event.place = Some("Marylebone, London".into());
        let event = add_life_event(&state, event).await.unwrap();

        let located = locate_life_event(&state, event.id).await.unwrap();
        assert_eq!(located.latitude, Some(51.5225));
        assert_eq!(located.longitude, Some(-0.1488));
    }

    #[tokio::test]
    async fn test_locate_without_place_is_noop() {
        let (state, _dir) = app_state().await;
        let member = member_id(&state).await;
        let event = add_life_event(&state, LifeEvent::new(0, member, LifeEventKind::Death))
            .await
            .unwrap();

        let located = locate_life_event(&state, event.id).await.unwrap();
        assert!(!located.has_coordinates());
    }
}
