//! UploadService — accepts picture uploads and serves them back.
//!
//! Sole writer to the media directory. Classification is by declared media
//! type only; bytes are never sniffed. That matches the source system and is
//! a documented limitation, not an oversight.

use bytes::Bytes;
use chrono::Utc;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs::{self, File};
use tracing::debug;

/// Media types an upload may declare. Anything else is silently skipped.
const ALLOWED_MEDIA_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid filename")]
    InvalidFilename,
    #[error("file `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Disk-backed upload handling: validate the declared type, pick a
/// collision-resistant stored name, persist the bytes, and later open them
/// for read-only serving.
#[derive(Clone)]
pub struct UploadService {
    /// Directory where accepted uploads live, flat, one file per upload.
    pub media_dir: PathBuf,
}

impl UploadService {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }

    /// Accept at most one file per create request.
    ///
    /// Returns `Ok(None)` when the declared type is not an allowed image
    /// type — an unsupported upload produces "no file accepted", never a
    /// failed request. On acceptance the stored name is the current time in
    /// milliseconds plus the original extension, so distinct calls get
    /// distinct names in practice. A same-millisecond collision is an
    /// accepted risk, not guarded against.
    pub async fn accept(
        &self,
        original_name: &str,
        declared_type: &str,
        data: Bytes,
    ) -> UploadResult<Option<String>> {
        if !ALLOWED_MEDIA_TYPES
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(declared_type))
        {
            debug!(
                "skipping upload `{}`: declared type `{}` not allowed",
                original_name, declared_type
            );
            return Ok(None);
        }

        let stored_name = format!(
            "{}{}",
            Utc::now().timestamp_millis(),
            extension_of(original_name)
        );
        let path = self.media_dir.join(&stored_name);
        fs::write(&path, &data).await?;
        debug!("stored upload `{}` as {}", original_name, path.display());

        Ok(Some(stored_name))
    }

    /// Open a previously stored file for streaming out, together with the
    /// content type guessed from its extension.
    pub async fn open(&self, stored_name: &str) -> UploadResult<(File, &'static str)> {
        self.ensure_name_safe(stored_name)?;

        let path = self.media_dir.join(stored_name);
        let file = File::open(&path).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                UploadError::NotFound(stored_name.to_string())
            } else {
                UploadError::Io(err)
            }
        })?;

        Ok((file, content_type_for(stored_name)))
    }

    /// Reject names that could escape the media directory.
    ///
    /// Stored names never contain separators, so anything with `/`, `\`,
    /// `..`, or control bytes is not one of ours.
    fn ensure_name_safe(&self, name: &str) -> UploadResult<()> {
        if name.is_empty() || name.contains("..") {
            return Err(UploadError::InvalidFilename);
        }
        if name
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'/' || b == b'\\' || b == b'\0')
        {
            return Err(UploadError::InvalidFilename);
        }
        Ok(())
    }
}

/// Extension of the original upload, dot included, or empty if it has none.
fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// Map a stored filename to the content type it is served with.
fn content_type_for(name: &str) -> &'static str {
    match Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn test_service() -> UploadService {
        let dir = std::env::temp_dir().join(format!("profile-dir-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).await.expect("create media dir");
        UploadService::new(dir)
    }

    #[tokio::test]
    async fn png_upload_is_stored_with_extension() {
        let service = test_service().await;
        let stored = service
            .accept("avatar.png", "image/png", Bytes::from_static(b"fake png"))
            .await
            .expect("accept")
            .expect("png must be accepted");

        assert!(stored.ends_with(".png"), "stored name was {}", stored);
        let bytes = fs::read(service.media_dir.join(&stored))
            .await
            .expect("stored file readable");
        assert_eq!(bytes, b"fake png");
    }

    #[tokio::test]
    async fn gif_upload_is_silently_skipped() {
        let service = test_service().await;
        let stored = service
            .accept("anim.gif", "image/gif", Bytes::from_static(b"gif bytes"))
            .await
            .expect("skip is not an error");
        assert!(stored.is_none());

        // Nothing was written.
        let mut entries = fs::read_dir(&service.media_dir).await.expect("read dir");
        assert!(entries.next_entry().await.expect("next").is_none());
    }

    #[tokio::test]
    async fn jpeg_aliases_are_accepted() {
        let service = test_service().await;
        for (name, declared) in [("a.jpg", "image/jpg"), ("b.jpeg", "image/jpeg")] {
            let stored = service
                .accept(name, declared, Bytes::from_static(b"jpg"))
                .await
                .expect("accept")
                .expect("jpeg must be accepted");
            assert!(stored.ends_with(extension_of(name).as_str()));
        }
    }

    #[tokio::test]
    async fn stored_file_opens_with_guessed_content_type() {
        let service = test_service().await;
        let stored = service
            .accept("pic.png", "image/png", Bytes::from_static(b"png"))
            .await
            .expect("accept")
            .expect("accepted");

        let (_file, content_type) = service.open(&stored).await.expect("open");
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn traversal_names_are_rejected() {
        let service = test_service().await;
        for bad in ["../etc/passwd", "a/b.png", "", "a\\b.png"] {
            let err = service.open(bad).await.expect_err("must reject");
            assert!(matches!(err, UploadError::InvalidFilename), "{:?}", bad);
        }
    }

    #[tokio::test]
    async fn missing_file_maps_to_not_found() {
        let service = test_service().await;
        let err = service.open("123456789.png").await.expect_err("missing");
        assert!(matches!(err, UploadError::NotFound(name) if name == "123456789.png"));
    }

    #[test]
    fn extension_is_preserved_or_empty() {
        assert_eq!(extension_of("photo.PNG"), ".PNG");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("noext"), "");
    }
}
