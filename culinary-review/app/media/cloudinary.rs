use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use nails::multipart::FilePart;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tokio_util::io::ReaderStream;
use url::Url;

use super::{public_id_for, MediaError, MediaStore, StoredMedia};
use crate::config::CloudinaryConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Signed uploads to Cloudinary's image API.
///
/// Files are staged on local disk first and streamed from there, so a large
/// upload is not held twice in memory.
#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", API_BASE, self.config.cloud_name, action)
    }

    fn sign(&self, params: &[(&str, &str)]) -> String {
        sign_params(params, &self.config.api_secret)
    }

    async fn stage(&self, public_id: &str, file: &FilePart) -> Result<PathBuf, MediaError> {
        tokio::fs::create_dir_all(&self.config.staging_dir).await?;
        let path = self.config.staging_dir.join(public_id);
        tokio::fs::write(&path, &file.data).await?;
        Ok(path)
    }

    async fn send_staged(
        &self,
        path: &Path,
        public_id: &str,
        file: &FilePart,
    ) -> Result<StoredMedia, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", &timestamp)]);

        let staged = tokio::fs::File::open(path).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(staged));
        let mut part = Part::stream_with_length(body, file.data.len() as u64)
            .file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("public_id", public_id.to_owned())
            .text("signature", signature)
            .part("file", part);

        let resp = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let uploaded: UploadResponse = resp.json().await?;
        Ok(StoredMedia {
            url: uploaded.secure_url,
        })
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, file: &FilePart) -> Result<StoredMedia, MediaError> {
        if file.data.is_empty() {
            return Err(MediaError::EmptyFile(file.file_name.clone()));
        }
        let public_id = public_id_for(&file.file_name);
        let path = self.stage(&public_id, file).await?;
        let result = self.send_staged(&path, &public_id, file).await;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove staged upload");
        }
        let stored = result?;
        tracing::info!(url = %stored.url, "uploaded image");
        Ok(stored)
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let public_id =
            public_id_from_url(url).ok_or_else(|| MediaError::ForeignUrl(url.to_owned()))?;
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", &public_id), ("timestamp", &timestamp)]);
        let resp = self
            .client
            .post(self.endpoint("destroy"))
            .form(&[
                ("api_key", self.config.api_key.as_str()),
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let destroyed: DestroyResponse = resp.json().await?;
        match destroyed.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Rejected {
                status: 200,
                message: format!("destroy returned `{}`", other),
            }),
        }
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, MediaError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error.message)
        .unwrap_or(text);
    Err(MediaError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Cloudinary's request signature: sorted `k=v` pairs joined by `&`, then the secret, SHA-1 hex.
fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recovers the public id from a delivery URL such as
/// `https://res.cloudinary.com/demo/image/upload/v1712345678/image-pasta-0a1b.png`.
pub fn public_id_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();
    let upload = segments.iter().position(|s| *s == "upload")?;
    let mut rest = &segments[upload + 1..];
    if let Some(first) = rest.first() {
        let is_version = first.len() > 1
            && first.starts_with('v')
            && first[1..].chars().all(|c| c.is_ascii_digit());
        if is_version {
            rest = &rest[1..];
        }
    }
    if rest.is_empty() {
        return None;
    }
    let joined = rest.join("/");
    let id = match joined.rsplit_once('.') {
        Some((id, ext)) if !ext.contains('/') => id.to_owned(),
        _ => joined,
    };
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
