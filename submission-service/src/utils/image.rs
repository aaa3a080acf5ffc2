use std::path::Path;

use crate::services::error::ServiceError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47];
const GIF: &[u8] = &[0x47, 0x49, 0x46, 0x38];
const RIFF: &[u8] = b"RIFF";
const WEBP: &[u8] = b"WEBP";
const BMP: &[u8] = &[0x42, 0x4D];

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn looks_like_image(data: &[u8]) -> bool {
    if data.starts_with(RIFF) {
        return data.len() >= 12 && &data[8..12] == WEBP;
    }
    [JPEG, PNG, GIF, BMP].iter().any(|magic| data.starts_with(magic))
}

/// Size, extension and magic-number checks for an uploaded image.
pub fn validate_image(file_name: &str, data: &[u8], max_bytes: usize) -> Result<(), ServiceError> {
    if data.is_empty() {
        return Err(ServiceError::Validation("File is empty".to_string()));
    }
    if data.len() > max_bytes {
        return Err(ServiceError::PayloadTooLarge(max_bytes));
    }

    match extension(file_name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(ServiceError::Validation(
                "Unsupported file type; only images are accepted".to_string(),
            ))
        }
    }

    if !looks_like_image(data) {
        return Err(ServiceError::Validation(
            "File content does not match an image format".to_string(),
        ));
    }

    Ok(())
}

/// Content type served for a stored file, by extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_accepts_png() {
        assert!(validate_image("photo.PNG", PNG_BYTES, 1024).is_ok());
    }

    #[test]
    fn test_rejects_wrong_extension() {
        assert!(validate_image("photo.exe", PNG_BYTES, 1024).is_err());
        assert!(validate_image("photo", PNG_BYTES, 1024).is_err());
    }

    #[test]
    fn test_rejects_forged_content() {
        assert!(validate_image("photo.png", b"#!/bin/sh\necho hi", 1024).is_err());
        assert!(validate_image("photo.webp", b"RIFF0000WAVE", 1024).is_err());
        assert!(validate_image("photo.webp", b"RIFF0000WEBP", 1024).is_ok());
    }

    #[test]
    fn test_rejects_oversize() {
        assert!(matches!(
            validate_image("photo.png", PNG_BYTES, 4),
            Err(ServiceError::PayloadTooLarge(4))
        ));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.txt"), "application/octet-stream");
    }
}
