//! Image upload payload and the local checks that run before any request.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use crate::error::ClassificationError;

/// Largest image accepted for upload (10 MiB).
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Image formats the classification endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    /// Match a file extension, ignoring case. Returns `None` for anything
    /// outside jpg, jpeg, png and webp.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// One image ready to be sent: file name, raw bytes and declared format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl ImagePayload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            format,
        }
    }

    /// Load a user-selected image, enforcing the upload preconditions.
    ///
    /// Checks run in order:
    /// 1. the file must open for reading and be a regular file
    ///    (`FileUnavailable`);
    /// 2. it must not exceed `MAX_IMAGE_BYTES` (`PayloadTooLarge`);
    /// 3. its extension must map to an `ImageFormat` (`UnsupportedFormat`).
    ///
    /// An oversized file with an unsupported extension therefore reports
    /// `PayloadTooLarge`. The size check uses the open handle's metadata, so
    /// oversized files are never read into memory.
    pub fn from_path(path: &Path) -> Result<Self, ClassificationError> {
        let unavailable = |reason: String| ClassificationError::FileUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let mut file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
        let metadata = file.metadata().map_err(|e| unavailable(e.to_string()))?;
        if !metadata.is_file() {
            return Err(unavailable("not a regular file".to_string()));
        }
        check_size(metadata.len())?;

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = ImageFormat::from_extension(&extension)
            .ok_or(ClassificationError::UnsupportedFormat { extension })?;

        let mut bytes = Vec::with_capacity(metadata.len() as usize);
        file.read_to_end(&mut bytes).map_err(|e| unavailable(e.to_string()))?;
        // The file may have grown since the metadata call.
        check_size(bytes.len() as u64)?;

        Ok(Self::new(file_name_of(path), bytes, format))
    }

    /// Read an image the caller already knows to be valid, skipping the
    /// size and extension checks.
    pub(crate) fn read_trusted(path: &Path, format: ImageFormat) -> Result<Self, ClassificationError> {
        let bytes = fs::read(path).map_err(|e| ClassificationError::FileUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(file_name_of(path), bytes, format))
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

fn check_size(size: u64) -> Result<(), ClassificationError> {
    if size > MAX_IMAGE_BYTES {
        return Err(ClassificationError::PayloadTooLarge {
            size,
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}
