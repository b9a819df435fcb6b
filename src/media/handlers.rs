//! Upload HTTP handlers

use super::filter::{MAX_FILES, check_file};
use super::{MediaError, MediaFile, MediaHost, MediaKind, UploadedMedia};
use crate::core::error::ApiError;
use crate::core::response::{self, DataEnvelope};
use axum::extract::{Multipart, State};
use axum::extract::multipart::MultipartError;
use axum::response::Json;
use futures::future::try_join_all;
use serde_json::{Value, json};
use std::sync::Arc;

const NO_FILE: &str = "Aucun fichier uploadé";

#[derive(Clone)]
pub struct UploadAppState {
    pub host: Arc<dyn MediaHost>,
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Disabled => {
                ApiError::Unavailable("Service d'upload non configuré".to_string())
            }
            other => ApiError::internal(other.to_string()),
        }
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::validation(format!("Requête multipart invalide: {}", err.body_text()))
}

/// Collect the files sent under `field`, checking each one
///
/// Other fields are ignored. More than `max` files is rejected.
async fn read_files(
    multipart: &mut Multipart,
    field_name: &str,
    max: usize,
) -> Result<Vec<MediaFile>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(field_name) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().unwrap_or_default().to_string();

        if files.len() == max {
            return Err(ApiError::validation(format!(
                "Trop de fichiers ({} maximum)",
                max
            )));
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        check_file(&file_name, &content_type, bytes.len())?;
        files.push(MediaFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(ApiError::validation(NO_FILE));
    }
    Ok(files)
}

async fn upload_single(
    state: &UploadAppState,
    mut multipart: Multipart,
    field_name: &str,
    kind: MediaKind,
) -> Result<UploadedMedia, ApiError> {
    let mut files = read_files(&mut multipart, field_name, 1).await?;
    let file = files.remove(0);
    Ok(state.host.upload(file, kind).await?)
}

pub async fn upload_image(
    State(state): State<UploadAppState>,
    multipart: Multipart,
) -> Result<Json<DataEnvelope<UploadedMedia>>, ApiError> {
    let uploaded = upload_single(&state, multipart, "image", MediaKind::Image).await?;
    Ok(response::ok(uploaded))
}

pub async fn upload_images(
    State(state): State<UploadAppState>,
    mut multipart: Multipart,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let files = read_files(&mut multipart, "images", MAX_FILES).await?;
    let uploaded = try_join_all(
        files
            .into_iter()
            .map(|file| state.host.upload(file, MediaKind::Image)),
    )
    .await?;
    Ok(response::ok(json!({ "files": uploaded })))
}

pub async fn upload_video(
    State(state): State<UploadAppState>,
    multipart: Multipart,
) -> Result<Json<DataEnvelope<UploadedMedia>>, ApiError> {
    let uploaded = upload_single(&state, multipart, "video", MediaKind::Video).await?;
    Ok(response::ok(uploaded))
}
