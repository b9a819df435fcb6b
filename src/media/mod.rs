//! Media upload to a third-party host
//!
//! Admin uploads are filtered by type and size, then forwarded to a
//! [`MediaHost`]. The host stores the file (applying its own transformations)
//! and returns the public URL.

pub mod cloudinary;
pub mod descriptor;
pub mod filter;
pub mod handlers;

pub use cloudinary::{CloudinaryConfig, CloudinaryHost};
pub use descriptor::UploadDescriptor;
pub use filter::{MAX_FILE_SIZE, MAX_FILES, check_file};

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Kind of resource, decides the transformation applied by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// A file received from a multipart upload
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Location of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("no media host is configured")]
    Disabled,

    #[error("media host transport error: {0}")]
    Transport(String),

    #[error("media host rejected the upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected media host response: {0}")]
    InvalidResponse(String),
}

/// Stores uploaded files and returns their public URL
#[async_trait]
pub trait MediaHost: Send + Sync {
    fn name(&self) -> &str;

    async fn upload(&self, file: MediaFile, kind: MediaKind) -> Result<UploadedMedia, MediaError>;
}

/// Used when no media host is configured; every upload fails
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledHost;

#[async_trait]
impl MediaHost for DisabledHost {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn upload(&self, file: MediaFile, _kind: MediaKind) -> Result<UploadedMedia, MediaError> {
        tracing::warn!(file = %file.file_name, "upload refused: no media host configured");
        Err(MediaError::Disabled)
    }
}

/// Keeps uploads in memory and hands out `memory://` URLs
///
/// Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    stored: Arc<Mutex<Vec<(MediaKind, MediaFile)>>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// File names stored so far, oldest first
    pub fn stored(&self) -> Vec<String> {
        let stored = match self.stored.lock() {
            Ok(stored) => stored,
            Err(poisoned) => poisoned.into_inner(),
        };
        stored.iter().map(|(_, file)| file.file_name.clone()).collect()
    }
}

#[async_trait]
impl MediaHost for MemoryHost {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(&self, file: MediaFile, kind: MediaKind) -> Result<UploadedMedia, MediaError> {
        let public_id = format!("yooreed-event/{}", uuid::Uuid::new_v4());
        let url = format!("memory://{}/{}", kind.as_str(), public_id);
        self.stored
            .lock()
            .map_err(|e| MediaError::Transport(format!("store lock poisoned: {}", e)))?
            .push((kind, file));
        Ok(UploadedMedia { url, public_id })
    }
}
