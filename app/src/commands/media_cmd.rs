//! Commands for media attached to members

use std::path::PathBuf;

use crate::domain::{Media, MediaKind};
use crate::repository::Repository;
use crate::AppState;

/// Attach a file on disk to a member
pub async fn attach_media(state: &AppState, member_id: u32, path: String) -> Result<Media, String> {
    state
        .media_repo
        .attach_file(member_id, PathBuf::from(path))
        .await
        .map_err(|e| e.to_string())
}

pub async fn list_media(
    state: &AppState,
    member_id: u32,
    kind: Option<MediaKind>,
) -> Result<Vec<Media>, String> {
    let repo = &state.media_repo;
    let result = match kind {
        Some(kind) => repo.list_by_kind(member_id, kind).await,
        None => repo.list_for_member(member_id).await,
    };
    result.map_err(|e| e.to_string())
}

/// Edit title, description, date taken or kind
pub async fn update_media(state: &AppState, media: Media) -> Result<Media, String> {
    state.media_repo.update(&media).await.map_err(|e| e.to_string())
}

/// Forget a media record; the file itself is left alone
pub async fn delete_media(state: &AppState, id: u32) -> Result<(), String> {
    state.media_repo.delete(id).await.map_err(|e| e.to_string())
}

pub async fn get_media_total_size(state: &AppState, member_id: u32) -> Result<u64, String> {
    state
        .media_repo
        .total_size_for_member(member_id)
        .await
        .map_err(|e| e.to_string())
}

/// Other media records with the same file content
pub async fn find_duplicate_media(state: &AppState, id: u32) -> Result<Vec<Media>, String> {
    let media = state.media_repo.get(id).await.map_err(|e| e.to_string())?;

    let Some(hash) = media.content_hash else {
        return Ok(Vec::new());
    };

    let same = state
        .media_repo
        .find_by_content_hash(&hash)
        .await
        .map_err(|e| e.to_string())?;
    Ok(same.into_iter().filter(|m| m.id != id).collect())
}
