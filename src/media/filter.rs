//! Upload file filtering

use crate::core::error::ApiError;
use regex::Regex;
use std::sync::OnceLock;

/// Per-file size limit (10 MiB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Files accepted by a multi-file upload
pub const MAX_FILES: usize = 10;

const REJECTED_TYPE: &str = "Seuls les fichiers image (JPEG, JPG, PNG, GIF, WEBP) et vidéo (MP4, MOV, AVI) sont autorisés";

fn allowed(value: &str) -> bool {
    static ALLOWED_TYPES: OnceLock<Option<Regex>> = OnceLock::new();
    ALLOWED_TYPES
        .get_or_init(|| Regex::new("jpeg|jpg|png|gif|webp|mp4|mov|avi").ok())
        .as_ref()
        .is_some_and(|regex| regex.is_match(value))
}

/// Accept a file only when both its MIME type and its name mention an
/// allowed format, and it fits the size limit
pub fn check_file(file_name: &str, content_type: &str, size: usize) -> Result<(), ApiError> {
    if !(allowed(content_type) && allowed(&file_name.to_lowercase())) {
        tracing::debug!(file = %file_name, %content_type, "upload rejected: file type");
        return Err(ApiError::validation(REJECTED_TYPE));
    }

    if size > MAX_FILE_SIZE {
        return Err(ApiError::validation("Fichier trop volumineux (10 Mo maximum)"));
    }
    Ok(())
}
