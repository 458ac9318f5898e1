//! Image validation and the media host that stores event images.
//!
//! The production host is Cloudinary's signed REST upload API. Uploads are
//! signed with SHA-256 over the sorted request parameters plus the API secret.

use async_trait::async_trait;
use chrono::Utc;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::error::{EventError, Result};

/// Largest accepted image, in bytes (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const ACCEPTED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];

/// An image file taken from a submission.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: Option<String>,
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: String,
    /// Host-side identifier, needed to delete the image again
    pub public_id: String,
}

/// Reject images with an unsupported content type or above [`MAX_IMAGE_BYTES`].
pub fn validate_image(image: &ImageUpload) -> Result<()> {
    let mime = image
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if !ACCEPTED_IMAGE_TYPES.contains(&mime.as_str()) {
        return Err(EventError::MediaRejected(format!(
            "Unsupported image type '{}'. Allowed types: {}",
            image.content_type,
            ACCEPTED_IMAGE_TYPES.join(", ")
        )));
    }

    if image.bytes.len() > MAX_IMAGE_BYTES {
        return Err(EventError::MediaRejected(format!(
            "Image is {} bytes; the limit is {} bytes (5 MB)",
            image.bytes.len(),
            MAX_IMAGE_BYTES
        )));
    }

    Ok(())
}

/// Third-party image storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedMedia>;

    /// Delete a previously uploaded image.
    async fn destroy(&self, public_id: &str) -> Result<()>;
}

/// Cloudinary credentials and upload settings.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder that uploads are placed in
    pub folder: String,
    pub timeout_secs: u64,
    pub api_base_url: String,
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .field("folder", &self.folder)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

const CREDENTIAL_VARS: [&str; 3] = [
    "CLOUDINARY_CLOUD_NAME",
    "CLOUDINARY_API_KEY",
    "CLOUDINARY_API_SECRET",
];

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: "events".to_string(),
            timeout_secs: 30,
            api_base_url: "https://api.cloudinary.com/v1_1".to_string(),
        }
    }

    /// `Ok(None)` when no credential variable is set; an error when only some are.
    pub fn optional_from_env() -> std::result::Result<Option<Self>, ConfigError> {
        let present = CREDENTIAL_VARS
            .iter()
            .filter(|key| std::env::var(key).is_ok_and(|v| !v.trim().is_empty()))
            .count();

        match present {
            0 => Ok(None),
            n if n == CREDENTIAL_VARS.len() => Self::from_env().map(Some),
            _ => Err(ConfigError::Invalid(format!(
                "set all of {} or none of them",
                CREDENTIAL_VARS.join(", ")
            ))),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.api_base_url.trim_end_matches('/'),
            self.cloud_name,
            action
        )
    }
}

/// Environment variables:
/// - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` (required)
/// - `CLOUDINARY_FOLDER` (default: `events`)
/// - `CLOUDINARY_TIMEOUT_SECS` (default: 30)
/// - `CLOUDINARY_API_BASE_URL` (default: `https://api.cloudinary.com/v1_1`)
impl FromEnv for CloudinaryConfig {
    fn from_env() -> std::result::Result<Self, ConfigError> {
        let mut config = Self::new(
            env_required("CLOUDINARY_CLOUD_NAME")?,
            env_required("CLOUDINARY_API_KEY")?,
            env_required("CLOUDINARY_API_SECRET")?,
        );
        config.folder = env_or_default("CLOUDINARY_FOLDER", &config.folder);
        config.timeout_secs = env_parse("CLOUDINARY_TIMEOUT_SECS", config.timeout_secs)?;
        config.api_base_url = env_or_default("CLOUDINARY_API_BASE_URL", &config.api_base_url);
        Ok(config)
    }
}

/// Hex SHA-256 of the `&`-joined, key-sorted `key=value` pairs followed by the secret.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by_key(|(key, _)| *key);

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`MediaHost`] backed by Cloudinary's REST API.
#[derive(Clone)]
pub struct CloudinaryMediaHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryMediaHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EventError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Fields every signed call carries, plus the signature over `params`.
    fn signed_form(&self, params: &[(&str, &str)]) -> Form {
        let timestamp = Utc::now().timestamp().to_string();
        let mut signed: Vec<(&str, &str)> = params.to_vec();
        signed.push(("timestamp", &timestamp));
        let signature = sign(&signed, &self.config.api_secret);

        let mut form = Form::new();
        for (key, value) in signed {
            form = form.text(key.to_string(), value.to_string());
        }
        form.text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn send(&self, action: &str, form: Form) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.config.endpoint(action))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);
        Err(EventError::UpstreamUpload(format!(
            "media host answered {}: {}",
            status, message
        )))
    }
}

#[async_trait]
impl MediaHost for CloudinaryMediaHost {
    #[instrument(skip(self, image), fields(size = image.bytes.len(), content_type = %image.content_type))]
    async fn upload(&self, image: ImageUpload) -> Result<UploadedMedia> {
        let filename = image.filename.unwrap_or_else(|| "upload".to_string());
        let file = Part::bytes(image.bytes)
            .file_name(filename)
            .mime_str(&image.content_type)?;

        let params: Vec<(&str, &str)> = if self.config.folder.is_empty() {
            Vec::new()
        } else {
            vec![("folder", self.config.folder.as_str())]
        };
        let form = self.signed_form(&params).part("file", file);

        let uploaded: UploadResponse = self.send("upload", form).await?.json().await?;
        info!(public_id = %uploaded.public_id, "Image uploaded");

        Ok(UploadedMedia {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }

    #[instrument(skip(self))]
    async fn destroy(&self, public_id: &str) -> Result<()> {
        let form = self.signed_form(&[("public_id", public_id)]);
        let outcome: DestroyResponse = self.send("destroy", form).await?.json().await?;

        if outcome.result != "ok" {
            warn!(result = %outcome.result, "Media host did not delete the image");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Multipart, Path, State};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn image(content_type: &str, size: usize) -> ImageUpload {
        ImageUpload {
            bytes: vec![0u8; size],
            content_type: content_type.to_string(),
            filename: Some("poster.png".to_string()),
        }
    }

    #[test]
    fn test_accepts_listed_types() {
        for content_type in ACCEPTED_IMAGE_TYPES {
            assert!(validate_image(&image(content_type, 10)).is_ok(), "{}", content_type);
        }
        assert!(validate_image(&image("IMAGE/PNG; charset=binary", 10)).is_ok());
    }

    #[test]
    fn test_rejects_text_plain() {
        let err = validate_image(&image("text/plain", 10)).unwrap_err();
        assert!(matches!(err, EventError::MediaRejected(_)));
    }

    #[test]
    fn test_size_boundary() {
        assert!(validate_image(&image("image/png", MAX_IMAGE_BYTES)).is_ok());
        let err = validate_image(&image("image/png", MAX_IMAGE_BYTES + 1)).unwrap_err();
        assert!(matches!(err, EventError::MediaRejected(_)));
    }

    #[test]
    fn test_signature_sorts_parameters() {
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"folder=events&timestamp=1700000000secret");
            format!("{:x}", hasher.finalize())
        };

        let signature = sign(
            &[("timestamp", "1700000000"), ("folder", "events")],
            "secret",
        );
        assert_eq!(signature, expected);
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_optional_from_env_none_when_unset() {
        temp_env::with_vars(
            [
                ("CLOUDINARY_CLOUD_NAME", None::<&str>),
                ("CLOUDINARY_API_KEY", None),
                ("CLOUDINARY_API_SECRET", None),
            ],
            || assert!(CloudinaryConfig::optional_from_env().unwrap().is_none()),
        );
    }

    #[test]
    fn test_optional_from_env_rejects_partial_credentials() {
        temp_env::with_vars(
            [
                ("CLOUDINARY_CLOUD_NAME", Some("demo")),
                ("CLOUDINARY_API_KEY", None),
                ("CLOUDINARY_API_SECRET", None),
            ],
            || {
                let err = CloudinaryConfig::optional_from_env().unwrap_err();
                assert!(matches!(err, ConfigError::Invalid(_)));
            },
        );
    }

    #[test]
    fn test_from_env_with_defaults() {
        temp_env::with_vars(
            [
                ("CLOUDINARY_CLOUD_NAME", Some("demo")),
                ("CLOUDINARY_API_KEY", Some("key")),
                ("CLOUDINARY_API_SECRET", Some("secret")),
                ("CLOUDINARY_FOLDER", None),
                ("CLOUDINARY_TIMEOUT_SECS", Some("5")),
                ("CLOUDINARY_API_BASE_URL", None),
            ],
            || {
                let config = CloudinaryConfig::optional_from_env().unwrap().unwrap();
                assert_eq!(config.cloud_name, "demo");
                assert_eq!(config.folder, "events");
                assert_eq!(config.timeout_secs, 5);
                assert!(!format!("{:?}", config).contains("secret\""));
            },
        );
    }

    type Captured = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

    /// Stand-in for the Cloudinary API that records the text fields of each call.
    async fn fake_cloudinary() -> (String, Captured) {
        async fn handle(
            State(captured): State<Captured>,
            Path((_cloud, action)): Path<(String, String)>,
            mut multipart: Multipart,
        ) -> Json<serde_json::Value> {
            let mut fields = HashMap::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().unwrap_or_default().to_string();
                if name == "file" {
                    let bytes = field.bytes().await.unwrap();
                    fields.insert(name, bytes.len().to_string());
                } else {
                    fields.insert(name, field.text().await.unwrap());
                }
            }
            captured.lock().await.push((action.clone(), fields));

            if action == "upload" {
                Json(serde_json::json!({
                    "secure_url": "https://res.cloudinary.com/demo/image/upload/events/abc.png",
                    "public_id": "events/abc"
                }))
            } else {
                Json(serde_json::json!({ "result": "ok" }))
            }
        }

        let captured: Captured = Arc::default();
        let app = Router::new()
            .route("/{cloud}/image/{action}", post(handle))
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        (format!("http://{}", addr), captured)
    }

    #[tokio::test]
    async fn test_upload_and_destroy_are_signed() {
        let (base_url, captured) = fake_cloudinary().await;
        let mut config = CloudinaryConfig::new("demo", "key", "secret");
        config.api_base_url = base_url;
        let host = CloudinaryMediaHost::new(config).unwrap();

        let uploaded = host.upload(image("image/png", 128)).await.unwrap();
        assert_eq!(uploaded.public_id, "events/abc");
        assert!(uploaded.url.starts_with("https://"));

        host.destroy(&uploaded.public_id).await.unwrap();

        let calls = captured.lock().await;
        assert_eq!(calls.len(), 2);

        let (action, fields) = &calls[0];
        assert_eq!(action, "upload");
        assert_eq!(fields["file"], "128");
        assert_eq!(fields["folder"], "events");
        assert_eq!(fields["api_key"], "key");
        assert_eq!(fields["signature_algorithm"], "sha256");
        let expected = sign(
            &[("folder", "events"), ("timestamp", fields["timestamp"].as_str())],
            "secret",
        );
        assert_eq!(fields["signature"], expected);

        let (action, fields) = &calls[1];
        assert_eq!(action, "destroy");
        assert_eq!(fields["public_id"], "events/abc");
    }

    #[tokio::test]
    async fn test_upstream_error_is_reported() {
        let app = Router::new().route(
            "/{cloud}/image/{action}",
            post(|| async {
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "error": { "message": "Invalid Signature" } })),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let mut config = CloudinaryConfig::new("demo", "key", "wrong");
        config.api_base_url = format!("http://{}", addr);
        let host = CloudinaryMediaHost::new(config).unwrap();

        let err = host.upload(image("image/png", 16)).await.unwrap_err();
        match err {
            EventError::UpstreamUpload(message) => assert!(message.contains("Invalid Signature")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
