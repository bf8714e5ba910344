//! Uploaded image handling.
//!
//! Validation happens here, before any storage or model call is made.

use crate::errors::{Error, Result};

const ACCEPTED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// An image received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name as sent by the client
    pub file_name: String,
    /// Declared MIME type
    pub content_type: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Creates an upload from its parts.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Checks type, emptiness and size.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] for unsupported types, empty files, or files
    /// larger than `max_bytes`.
    pub fn validate(&self, max_bytes: usize) -> Result<()> {
        let content_type = self.content_type.to_ascii_lowercase();
        if !ACCEPTED_TYPES.contains(&content_type.as_str()) {
            return Err(Error::validation(format!(
                "Unsupported image type '{}'. Please upload a JPEG, PNG, GIF, or WebP image.",
                self.content_type
            )));
        }
        if self.bytes.is_empty() {
            return Err(Error::validation(format!("{} is empty", self.file_name)));
        }
        if self.bytes.len() > max_bytes {
            return Err(Error::validation(format!(
                "{} is {} bytes; the limit is {} bytes",
                self.file_name,
                self.bytes.len(),
                max_bytes
            )));
        }
        Ok(())
    }

    /// File extension used for the stored object.
    ///
    /// Taken from the file name when it has a short alphanumeric one, otherwise
    /// derived from the content type.
    #[must_use]
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            });

        from_name.unwrap_or_else(|| {
            match self.content_type.to_ascii_lowercase().as_str() {
                "image/png" => "png",
                "image/gif" => "gif",
                "image/webp" => "webp",
                _ => "jpg",
            }
            .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 1024;

    #[test]
    fn test_accepts_supported_types() {
        for content_type in ["image/jpeg", "image/PNG", "image/gif", "image/webp"] {
            let image = ImageUpload::new("leaf.jpg", content_type, vec![1, 2, 3]);
            assert!(image.validate(MAX).is_ok(), "{content_type} should be accepted");
        }
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let image = ImageUpload::new("notes.pdf", "application/pdf", vec![1]);
        assert!(matches!(image.validate(MAX), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        let empty = ImageUpload::new("a.png", "image/png", Vec::new());
        assert!(matches!(empty.validate(MAX), Err(Error::Validation { .. })));

        let big = ImageUpload::new("a.png", "image/png", vec![0; MAX + 1]);
        assert!(matches!(big.validate(MAX), Err(Error::Validation { .. })));

        let exact = ImageUpload::new("a.png", "image/png", vec![0; MAX]);
        assert!(exact.validate(MAX).is_ok());
    }

    #[test]
    fn test_extension() {
        assert_eq!(ImageUpload::new("Fern.JPEG", "image/jpeg", vec![]).extension(), "jpeg");
        assert_eq!(ImageUpload::new("photo", "image/webp", vec![]).extension(), "webp");
        assert_eq!(ImageUpload::new("x.../../etc", "image/png", vec![]).extension(), "png");
        assert_eq!(ImageUpload::new("blob", "image/jpeg", vec![]).extension(), "jpg");
    }
}
