//! Media Entity
//!
//! Files (photos, scanned documents, recordings) attached to a member.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Document,
    Audio,
    Video,
    #[default]
    Other,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "photo" => MediaKind::Photo,
            "document" => MediaKind::Document,
            "audio" => MediaKind::Audio,
            "video" => MediaKind::Video,
            _ => MediaKind::Other,
        }
    }

    /// Classify a MIME essence string such as `image/jpeg`
    pub fn from_mime(mime: &str) -> Self {
        let (top, sub) = mime.split_once('/').unwrap_or((mime, ""));
        match top {
            "image" => MediaKind::Photo,
            "audio" => MediaKind::Audio,
            "video" => MediaKind::Video,
            "text" => MediaKind::Document,
            "application" => match sub {
                "pdf" | "msword" | "rtf" | "vnd.oasis.opendocument.text" => MediaKind::Document,
                s if s.starts_with("vnd.openxmlformats-officedocument") => MediaKind::Document,
                _ => MediaKind::Other,
            },
            _ => MediaKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: u32,
    pub member_id: u32,
    pub kind: MediaKind,
    pub file_path: String,
    /// Size in bytes
    pub file_size: u64,
    pub mime_type: Option<String>,
    /// blake3 hex digest of the file content
    pub content_hash: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date_taken: Option<NaiveDate>,
    pub created_at: i64,
}

impl Media {
    pub fn new(id: u32, member_id: u32, kind: MediaKind, file_path: String, file_size: u64) -> Self {
        Self {
            id,
            member_id,
            kind,
            file_path,
            file_size,
            mime_type: None,
            content_hash: None,
            title: None,
            description: None,
            date_taken: None,
            created_at: 0,
        }
    }
}

impl Entity for Media {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/jpeg"), MediaKind::Photo);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Document);
        assert_eq!(
            MediaKind::from_mime("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            MediaKind::Document
        );
        assert_eq!(MediaKind::from_mime("text/plain"), MediaKind::Document);
        assert_eq!(MediaKind::from_mime("audio/mpeg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("application/zip"), MediaKind::Other);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MediaKind::from_str(MediaKind::Video.as_str()), MediaKind::Video);
        assert_eq!(MediaKind::from_str(""), MediaKind::Other);
    }
}
