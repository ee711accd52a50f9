//! File Identification Logic
//!
//! Size, MIME type and content hash of files attached as media.

use std::fs;
use std::io::Read;
use std::path::Path;

use super::entity::{DomainError, DomainResult};
use super::media::MediaKind;

/// What the media repository records about a file on disk
#[derive(Debug, Clone, PartialEq)]
pub struct FileFingerprint {
    pub size: u64,
    pub mime_type: Option<String>,
    pub kind: MediaKind,
    pub content_hash: String,
}

pub struct FileIdentifier;

impl FileIdentifier {
    /// Compute full content hash.
    /// Used to detect the same file attached twice.
    pub fn compute_content_hash(path: &Path) -> DomainResult<String> {
        // Read in chunks to avoid loading large scans into memory
        let mut file = fs::File::open(path)?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = [0; 65536];

        loop {
            match file.read(&mut buffer)? {
                0 => break,
                n => {
                    hasher.update(&buffer[..n]);
                }
            }
        }

        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Inspect a regular file: size, guessed MIME type, kind and hash
    pub fn fingerprint(path: &Path) -> DomainResult<FileFingerprint> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(DomainError::InvalidInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string());
        let kind = mime_type
            .as_deref()
            .map(MediaKind::from_mime)
            .unwrap_or_default();

        Ok(FileFingerprint {
            size: metadata.len(),
            mime_type,
            kind,
            content_hash: Self::compute_content_hash(path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_photo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grandma.jpg");
        fs::write(&path, b"not really a jpeg").unwrap();

        let fp = FileIdentifier::fingerprint(&path).unwrap();
        assert_eq!(fp.size, 17);
        assert_eq!(fp.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(fp.kind, MediaKind::Photo);
        assert_eq!(fp.content_hash, blake3::hash(b"not really a jpeg").to_hex().to_string());
    }

    #[test]
    fn test_fingerprint_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.zzqq");
        fs::write(&path, b"x").unwrap();

        let fp = FileIdentifier::fingerprint(&path).unwrap();
        assert_eq!(fp.mime_type, None);
        assert_eq!(fp.kind, MediaKind::Other);
    }

    #[test]
    fn test_fingerprint_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileIdentifier::fingerprint(dir.path()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_same_content_same_hash() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        fs::write(&a, b"certificate").unwrap();
        fs::write(&b, b"certificate").unwrap();

        assert_eq!(
            FileIdentifier::compute_content_hash(&a).unwrap(),
            FileIdentifier::compute_content_hash(&b).unwrap()
        );
    }
}
