//! Image selection rules for diagnosis uploads

use crate::api::models::ImageFile;
use crate::core::config::DEFAULT_MAX_IMAGE_BYTES;
use crate::core::error::Result;
use std::fmt;
use std::path::Path;

/// Content types accepted for analysis start with this prefix
pub const IMAGE_CONTENT_PREFIX: &str = "image/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotAnImage { content_type: String },
    TooLarge { size: u64, limit: u64 },
    Unreadable { reason: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotAnImage { content_type } => {
                write!(f, "is not an image ({})", content_type)
            }
            Rejection::TooLarge { size, limit } => write!(
                f,
                "is {} which exceeds the {} limit",
                format_size(*size),
                format_size(*limit)
            ),
            Rejection::Unreadable { reason } => write!(f, "could not be read: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageFilter {
    max_bytes: u64,
}

impl ImageFilter {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn check_type(&self, content_type: &str) -> std::result::Result<(), Rejection> {
        if content_type.to_ascii_lowercase().starts_with(IMAGE_CONTENT_PREFIX) {
            Ok(())
        } else {
            Err(Rejection::NotAnImage {
                content_type: if content_type.is_empty() {
                    "unknown type".to_string()
                } else {
                    content_type.to_string()
                },
            })
        }
    }

    pub fn check_size(&self, size: u64) -> std::result::Result<(), Rejection> {
        if size <= self.max_bytes {
            Ok(())
        } else {
            Err(Rejection::TooLarge {
                size,
                limit: self.max_bytes,
            })
        }
    }

    pub fn check(&self, image: &ImageFile) -> std::result::Result<(), Rejection> {
        self.check_type(&image.content_type)?;
        self.check_size(image.size())
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_BYTES)
    }
}

/// Guess a content type from the file extension
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_default()
}

/// Read an image from disk
pub fn load_image(path: &Path) -> Result<ImageFile> {
    let data = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ImageFile::new(filename, content_type_for(path), data))
}

/// Human readable size, e.g. `2.0 MB`
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f >= MB {
        format!("{:.1} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{} B", bytes)
    }
}
