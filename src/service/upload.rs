use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;
use crate::media::MediaStore;
use crate::service::with_deadline;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// File extension for the image formats accepted for upload.
pub fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(JPEG_MAGIC) {
        Some("jpg")
    } else if bytes.starts_with(PNG_MAGIC) {
        Some("png")
    } else {
        None
    }
}

#[derive(Clone)]
pub struct UploadService {
    media: Arc<dyn MediaStore>,
    max_bytes: usize,
    deadline: Duration,
}

impl UploadService {
    pub fn new(media: Arc<dyn MediaStore>, max_bytes: usize, deadline: Duration) -> Self {
        Self {
            media,
            max_bytes,
            deadline,
        }
    }

    /// Validate the image and hand it to the media store. Returns its URL.
    pub async fn upload(&self, user_id: i64, bytes: Vec<u8>) -> Result<String, AppError> {
        if bytes.len() > self.max_bytes {
            return Err(AppError::FileTooLarge);
        }

        let extension = sniff_image(&bytes).ok_or(AppError::FileNotSupported)?;

        let url = with_deadline(self.deadline, self.media.upload(bytes, user_id, extension)).await?;
        tracing::info!(user_id, %url, "file uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoStore;

    #[async_trait]
    impl MediaStore for EchoStore {
        async fn upload(&self, bytes: Vec<u8>, user_id: i64, extension: &str) -> Result<String, AppError> {
            Ok(format!("mem://{}/{}.{}", user_id, bytes.len(), extension))
        }

        async fn remove(&self, _url: &str, _user_id: i64) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn service(max_bytes: usize) -> UploadService {
        UploadService::new(Arc::new(EchoStore), max_bytes, Duration::from_secs(5))
    }

    #[test]
    fn test_sniff_image() {
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), Some("jpg"));
        assert_eq!(sniff_image(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]), Some("png"));
        assert_eq!(sniff_image(b"GIF89a"), None);
        assert_eq!(sniff_image(&[]), None);
    }

    #[tokio::test]
    async fn test_upload_accepts_jpeg() {
        let url = service(1024).upload(9, vec![0xFF, 0xD8, 0xFF, 0xE0]).await.unwrap();
        assert_eq!(url, "mem://9/4.jpg");
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_format() {
        let result = service(1024).upload(9, b"%PDF-1.7".to_vec()).await;
        assert!(matches!(result, Err(AppError::FileNotSupported)));
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized() {
        let mut bytes = JPEG_MAGIC.to_vec();
        bytes.resize(2048, 0);

        let result = service(1024).upload(9, bytes).await;
        assert!(matches!(result, Err(AppError::FileTooLarge)));
    }
}
