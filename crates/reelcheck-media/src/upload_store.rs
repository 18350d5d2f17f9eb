//! Local storage for uploaded reels.
//!
//! Files are written under generated names so the client-supplied filename
//! never becomes a path component. Bytes are streamed to a `.part` file and
//! renamed into place once complete, so a reader never sees a half-written
//! upload under its final name. A [`PendingUpload`] dropped before
//! [`PendingUpload::finish`] (for example when the client disconnects and the
//! handler future is cancelled) removes its `.part` file.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::MediaResult;

/// Longest client extension carried over to the stored name.
const MAX_EXTENSION_LEN: usize = 8;

/// Directory that accumulates uploaded files.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

/// An upload whose bytes are still being written.
#[derive(Debug)]
pub struct PendingUpload {
    file: File,
    part: PartFile,
    final_path: PathBuf,
    size: u64,
}

/// Removes the `.part` file on drop unless disarmed.
#[derive(Debug)]
struct PartFile {
    path: PathBuf,
    armed: bool,
}

impl PartFile {
    fn disarm(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed abandoned upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove partial upload {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// A fully written upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub size: u64,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_root(&self) -> MediaResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Open a new upload for the given client filename.
    pub async fn begin(&self, client_filename: &str) -> MediaResult<PendingUpload> {
        self.ensure_root().await?;

        let name = stored_file_name(client_filename);
        let final_path = self.root.join(&name);
        let part_path = self.root.join(format!("{name}.part"));
        let file = File::create(&part_path).await?;

        Ok(PendingUpload {
            file,
            part: PartFile {
                path: part_path,
                armed: true,
            },
            final_path,
            size: 0,
        })
    }
}

impl PendingUpload {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> MediaResult<()> {
        self.file.write_all(chunk).await?;
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Flush and move the file to its final name.
    ///
    /// On error the `.part` file is removed.
    pub async fn finish(self) -> MediaResult<StoredFile> {
        let PendingUpload {
            mut file,
            part,
            final_path,
            size,
        } = self;

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&part.path, &final_path).await?;
        part.disarm();

        tracing::debug!(path = %final_path.display(), size, "Stored upload");

        Ok(StoredFile {
            path: final_path,
            size,
        })
    }

    /// Drop a partially written upload (best effort).
    pub async fn discard(self) {
        let PendingUpload { file, part, .. } = self;
        drop(file);

        let part_path = part.disarm();
        if let Err(e) = fs::remove_file(&part_path).await {
            tracing::warn!(
                "Failed to remove partial upload {}: {}",
                part_path.display(),
                e
            );
        }
    }
}

/// Generated name keeping a short alphanumeric client extension.
fn stored_file_name(client_filename: &str) -> String {
    let id = Uuid::new_v4();
    let extension = Path::new(client_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    match extension {
        Some(ext) => format!("{}.{}", id, ext.to_ascii_lowercase()),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stored_file_name_keeps_extension() {
        let name = stored_file_name("My Reel.MP4");
        assert!(name.ends_with(".mp4"));
        assert!(Uuid::parse_str(name.trim_end_matches(".mp4")).is_ok());
    }

    #[test]
    fn test_stored_file_name_drops_odd_extensions() {
        assert!(Uuid::parse_str(&stored_file_name("noext")).is_ok());
        assert!(Uuid::parse_str(&stored_file_name("clip.mp4;rm -rf")).is_ok());
        assert!(Uuid::parse_str(&stored_file_name("../../etc/passwd")).is_ok());
    }

    #[tokio::test]
    async fn test_upload_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let mut pending = store.begin("reel.mov").await.unwrap();
        pending.write_chunk(b"first ").await.unwrap();
        pending.write_chunk(b"second").await.unwrap();
        let stored = pending.finish().await.unwrap();

        assert_eq!(stored.size, 12);
        assert_eq!(stored.path.parent(), Some(store.root()));
        assert_eq!(stored.path.extension().and_then(|e| e.to_str()), Some("mov"));
        assert_eq!(fs::read(&stored.path).await.unwrap(), b"first second");

        let mut entries = fs::read_dir(store.root()).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 1, "no .part file should remain");
    }

    #[tokio::test]
    async fn test_traversal_filename_stays_inside_root() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path());

        let pending = store.begin("../../escape.mp4").await.unwrap();
        let stored = pending.finish().await.unwrap();

        assert_eq!(stored.path.parent(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_same_name_uploads_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path());

        let a = store.begin("reel.mp4").await.unwrap().finish().await.unwrap();
        let b = store.begin("reel.mp4").await.unwrap().finish().await.unwrap();

        assert_ne!(a.path, b.path);
    }

    #[tokio::test]
    async fn test_dropped_upload_removes_part_file() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path());

        let mut pending = store.begin("reel.mp4").await.unwrap();
        pending.write_chunk(b"half a reel").await.unwrap();
        drop(pending);

        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_write_removes_part_file() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let task = tokio::spawn({
            let store = store.clone();
            async move {
                let mut pending = store.begin("reel.mp4").await.unwrap();
                pending.write_chunk(b"first chunk").await.unwrap();
                tx.send(()).unwrap();
                // Client never sends the rest.
                std::future::pending::<()>().await;
                pending.finish().await
            }
        });

        rx.await.unwrap();
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_discard_removes_part_file() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path());

        let mut pending = store.begin("reel.mp4").await.unwrap();
        pending.write_chunk(b"partial").await.unwrap();
        pending.discard().await;

        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
