//! Uploaded service documents.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use buckled_core::{Error, ImageMetadata, Result};

/// MIME types accepted for document extraction.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "application/pdf"];

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// The MIME type without parameters, lower-cased.
    pub fn essence(&self) -> String {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }

    /// Reject unsupported types and empty uploads.
    pub fn validate(&self) -> Result<()> {
        let essence = self.essence();
        if !ALLOWED_MIME_TYPES.contains(&essence.as_str()) {
            return Err(Error::Validation(format!(
                "Unsupported file type '{}'. Allowed: {}",
                self.mime_type,
                ALLOWED_MIME_TYPES.join(", ")
            )));
        }
        if self.bytes.is_empty() {
            return Err(Error::Validation("Uploaded file is empty".into()));
        }
        Ok(())
    }

    /// SHA-256 of the bytes, hex encoded.
    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.essence(), STANDARD.encode(&self.bytes))
    }

    pub fn metadata(&self, upload_time: DateTime<Utc>) -> ImageMetadata {
        ImageMetadata {
            file_name: self.file_name.clone(),
            file_size: self.bytes.len() as u64,
            mime_type: self.essence(),
            upload_time,
            content_hash: Some(self.content_hash()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_text_plain() {
        let doc = UploadedDocument::new("notes.txt", "text/plain", b"hello".to_vec());
        let err = doc.validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_accepts_allowlisted_with_params() {
        let doc = UploadedDocument::new("scan.PNG", "Image/PNG; charset=binary", vec![1, 2, 3]);
        assert!(doc.validate().is_ok());
        assert_eq!(doc.to_data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_rejects_empty_file() {
        let doc = UploadedDocument::new("invoice.pdf", "application/pdf", Vec::new());
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_metadata_hash() {
        let doc = UploadedDocument::new("a.jpg", "image/jpeg", b"abc".to_vec());
        let meta = doc.metadata(Utc::now());
        assert_eq!(meta.file_size, 3);
        assert_eq!(
            meta.content_hash.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }
}
