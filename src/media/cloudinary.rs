//! Cloudinary upload API client
//!
//! Uploads are signed server-side: the signed parameters are sorted by name,
//! joined as `k=v&k=v`, suffixed with the API secret and hashed with SHA-256.
//! The account must accept SHA-256 signatures.

use super::{MediaError, MediaFile, MediaHost, MediaKind, UploadedMedia};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
pub const DEFAULT_FOLDER: &str = "yooreed-event";

/// Longest side 1200px, automatic quality and format
const IMAGE_TRANSFORMATION: &str = "c_limit,h_1200,w_1200/q_auto/f_auto";
const VIDEO_TRANSFORMATION: &str = "q_auto";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

pub struct CloudinaryHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
    api_base: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config,
            api_base: API_BASE.to_string(),
        })
    }

    /// Point the client at another API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, kind: MediaKind) -> String {
        format!(
            "{}/{}/{}/upload",
            self.api_base,
            self.config.cloud_name,
            kind.as_str()
        )
    }
}

fn transformation(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => IMAGE_TRANSFORMATION,
        MediaKind::Video => VIDEO_TRANSFORMATION,
    }
}

/// Signature over already-sorted `(name, value)` pairs
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let payload = params
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&");
    format!("{:x}", Sha256::digest(format!("{}{}", payload, api_secret)))
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    fn name(&self) -> &str {
        "cloudinary"
    }

    async fn upload(&self, file: MediaFile, kind: MediaKind) -> Result<UploadedMedia, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let transformation = transformation(kind);
        let signature = sign(
            &[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
                ("transformation", transformation),
            ],
            &self.config.api_secret,
        );

        let size = file.bytes.len();
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| MediaError::Transport(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("transformation", transformation)
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint(kind))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;
        tracing::info!(
            file = %file.file_name,
            size,
            kind = kind.as_str(),
            public_id = %uploaded.public_id,
            "media uploaded"
        );

        Ok(UploadedMedia {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}
