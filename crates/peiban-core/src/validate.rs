//! Client-side input checks, mirroring what the backend enforces.
//!
//! Each check returns the message to show next to the offending field.

use std::path::Path;

pub const PHONE_LENGTH: usize = 11;
pub const MAX_CODE_LENGTH: usize = 6;
pub const MAX_CONTENT_CHARS: usize = 500;
pub const MAX_IMAGES: usize = 9;
pub const MAX_NICKNAME_CHARS: usize = 50;
pub const MAX_SIGNATURE_CHARS: usize = 200;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

pub fn phone(phone: &str) -> Result<(), &'static str> {
    if phone.len() == PHONE_LENGTH && phone.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("Enter an 11-digit phone number")
    }
}

pub fn code(code: &str) -> Result<(), &'static str> {
    if code.trim().is_empty() {
        Err("Enter the verification code")
    } else if code.chars().count() > MAX_CODE_LENGTH {
        Err("Verification code is too long")
    } else {
        Ok(())
    }
}

pub fn image_path(path: &Path) -> Result<(), &'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err("Only png, jpg, jpeg, gif and webp images are supported"),
    }
}

/// A journal entry needs a caption or at least one image, within limits.
pub fn log_entry(content: &str, image_count: usize) -> Result<(), &'static str> {
    if content.chars().count() > MAX_CONTENT_CHARS {
        Err("Caption cannot exceed 500 characters")
    } else if image_count > MAX_IMAGES {
        Err("At most 9 images per entry")
    } else if content.trim().is_empty() && image_count == 0 {
        Err("Add a caption or at least one image")
    } else {
        Ok(())
    }
}

pub fn profile(nickname: &str, signature: &str) -> Result<(), &'static str> {
    if nickname.chars().count() > MAX_NICKNAME_CHARS {
        Err("Nickname cannot exceed 50 characters")
    } else if signature.chars().count() > MAX_SIGNATURE_CHARS {
        Err("Signature cannot exceed 200 characters")
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone() {
        assert!(phone("13800138000").is_ok());
        assert!(phone("1380013800").is_err());
        assert!(phone("138001380001").is_err());
        assert!(phone("1380013800a").is_err());
        assert!(phone("").is_err());
    }

    #[test]
    fn test_code() {
        assert!(code("123456").is_ok());
        assert!(code("  ").is_err());
        assert!(code("1234567").is_err());
    }

    #[test]
    fn test_image_path() {
        assert!(image_path(Path::new("/tmp/a.JPG")).is_ok());
        assert!(image_path(Path::new("b.webp")).is_ok());
        assert!(image_path(Path::new("c.bmp")).is_err());
        assert!(image_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_log_entry() {
        assert!(log_entry("hello", 0).is_ok());
        assert!(log_entry("", 1).is_ok());
        assert!(log_entry("   ", 0).is_err());
        assert!(log_entry("x", 10).is_err());
        // Limit counts characters, not bytes
        assert!(log_entry(&"字".repeat(500), 0).is_ok());
        assert!(log_entry(&"字".repeat(501), 0).is_err());
    }

    #[test]
    fn test_profile() {
        assert!(profile("A", "").is_ok());
        assert!(profile(&"n".repeat(51), "").is_err());
        assert!(profile("A", &"s".repeat(201)).is_err());
    }
}
