use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::error::AppError;

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store image bytes for `user_id` and return a retrievable URL.
    async fn upload(&self, bytes: Vec<u8>, user_id: i64, extension: &str) -> Result<String, AppError>;

    async fn remove(&self, url: &str, user_id: i64) -> Result<(), AppError>;
}

fn user_folder(user_id: i64) -> String {
    format!("{}-images", user_id)
}

/// Files under a local directory, served back by the router under `/images`.
pub struct LocalMediaStore {
    root: PathBuf,
    public_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, url: &str) -> Result<PathBuf, AppError> {
        let relative = url
            .strip_prefix(&self.public_url)
            .map(|rest| rest.trim_start_matches('/'))
            .ok_or(AppError::PhotoNotFound)?;

        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::BadRequest(format!("invalid media path: {}", url)));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, bytes: Vec<u8>, user_id: i64, extension: &str) -> Result<String, AppError> {
        let folder = user_folder(user_id);
        let filename = format!("{}.{}", Uuid::new_v4(), extension);

        let dir = self.root.join(&folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::MediaStore(format!("create {}: {}", dir.display(), e)))?;

        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::MediaStore(format!("write {}: {}", path.display(), e)))?;

        Ok(format!("{}/{}/{}", self.public_url, folder, filename))
    }

    async fn remove(&self, url: &str, user_id: i64) -> Result<(), AppError> {
        let path = self.path_for(url)?;
        if !path.starts_with(self.root.join(user_folder(user_id))) {
            return Err(AppError::Forbidden);
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::PhotoNotFound),
            Err(e) => Err(AppError::MediaStore(format!("remove {}: {}", path.display(), e))),
        }
    }
}

const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";
const PUBLIC_ID_ROOT: &str = "mygram-image";
const EAGER_TRANSFORM: &str = "q_10";

#[derive(Debug, Deserialize)]
struct EagerResult {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: String,
    #[serde(default)]
    eager: Vec<EagerResult>,
}

#[derive(Debug, Deserialize)]
struct DestroyResult {
    result: String,
}

/// Signed uploads to Cloudinary's REST API.
pub struct CloudinaryStore {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryStore {
    pub fn new(cfg: &MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: cfg.cloudinary_cloud_name.clone(),
            api_key: cfg.cloudinary_api_key.clone(),
            api_secret: cfg.cloudinary_api_secret.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", CLOUDINARY_API, self.cloud_name, action)
    }

    /// Parameters must already be sorted by name.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        sign_params(params, &self.api_secret)
    }
}

fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn public_id(user_id: i64, name: &str) -> String {
    format!("{}/{}/{}", PUBLIC_ID_ROOT, user_folder(user_id), name)
}

/// Recover the file stem from a delivery URL such as
/// `.../upload/q_10/v1/mygram-image/7-images/<uuid>.jpg`.
fn stem_from_url(url: &str) -> Option<&str> {
    let last = url.rsplit('/').next()?;
    let stem = last.split('.').next()?;
    (!stem.is_empty()).then_some(stem)
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, bytes: Vec<u8>, user_id: i64, extension: &str) -> Result<String, AppError> {
        let public_id = public_id(user_id, &Uuid::new_v4().to_string());
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("eager", EAGER_TRANSFORM),
            ("public_id", &public_id),
            ("timestamp", &timestamp),
        ]);

        let file = reqwest::multipart::Part::bytes(bytes).file_name(format!("upload.{}", extension));
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("eager", EAGER_TRANSFORM)
            .text("public_id", public_id)
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::MediaStore(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::MediaStore(e.to_string()))?;

        let result: UploadResult = response
            .json()
            .await
            .map_err(|e| AppError::MediaStore(e.to_string()))?;

        // Prefer the transformed rendition when Cloudinary produced one
        Ok(result
            .eager
            .into_iter()
            .next()
            .map(|eager| eager.secure_url)
            .unwrap_or(result.secure_url))
    }

    async fn remove(&self, url: &str, user_id: i64) -> Result<(), AppError> {
        let stem = stem_from_url(url).ok_or(AppError::PhotoNotFound)?;
        let public_id = public_id(user_id, stem);
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", &public_id), ("timestamp", &timestamp)]);

        let params = [
            ("api_key", self.api_key.as_str()),
            ("public_id", public_id.as_str()),
            ("timestamp", timestamp.as_str()),
            ("signature", signature.as_str()),
        ];

        let result: DestroyResult = self
            .client
            .post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::MediaStore(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::MediaStore(e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::MediaStore(e.to_string()))?;

        if result.result.contains("not found") {
            return Err(AppError::PhotoNotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_matches_cloudinary_scheme() {
        // sha1("public_id=sample&timestamp=1315060510abcd")
        let signature = sign_params(&[("public_id", "sample"), ("timestamp", "1315060510")], "abcd");
        assert_eq!(signature, "c3470533147774275dd37996cc4d0e68fd03cd4f");
    }

    #[test]
    fn test_stem_from_delivery_url() {
        let url = "https://res.cloudinary.com/demo/image/upload/q_10/v1/mygram-image/7-images/abc-123.jpg";
        assert_eq!(stem_from_url(url), Some("abc-123"));
        assert_eq!(public_id(7, "abc-123"), "mygram-image/7-images/abc-123");
    }

    #[tokio::test]
    async fn test_local_store_roundtrip() {
        let root = std::env::temp_dir().join(format!("mygram-media-{}", Uuid::new_v4()));
        let store = LocalMediaStore::new(&root, "http://localhost:8080/images/");

        let url = store.upload(vec![0xFF, 0xD8, 0xFF], 3, "jpg").await.unwrap();
        assert!(url.starts_with("http://localhost:8080/images/3-images/"));
        assert!(url.ends_with(".jpg"));

        let path = store.path_for(&url).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![0xFF, 0xD8, 0xFF]);

        assert!(matches!(store.remove(&url, 4).await, Err(AppError::Forbidden)));
        store.remove(&url, 3).await.unwrap();
        assert!(matches!(store.remove(&url, 3).await, Err(AppError::PhotoNotFound)));

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[test]
    fn test_local_store_rejects_traversal() {
        let store = LocalMediaStore::new("/tmp/media", "http://localhost/images");
        assert!(store.path_for("http://localhost/images/../etc/passwd").is_err());
        assert!(store.path_for("http://elsewhere/images/1-images/a.jpg").is_err());
    }
}
