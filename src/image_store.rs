//! On-disk storage for category images.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::Error;

/// The maximum accepted size for a category image.
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Stores uploaded category images in a directory on disk.
///
/// File names are derived from the content hash so re-uploading the same
/// image is idempotent and file names never collide with user input.
#[derive(Debug, Clone)]
pub struct ImageStore {
    directory: PathBuf,
}

impl ImageStore {
    /// Create an image store that writes into `directory`.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The directory images are written to, for serving them back.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write `bytes` to disk and return the generated file name.
    ///
    /// The extension is carried over from `original_name` so the file is
    /// served with a sensible content type.
    ///
    /// # Errors
    /// Returns an [Error::StorageError] if the directory or file cannot be
    /// written.
    pub fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, Error> {
        let digest = md5::compute(bytes);
        let extension = Path::new(original_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| format!(".{}", extension.to_lowercase()))
            .unwrap_or_default();
        let file_name = format!("{digest:x}{extension}");

        fs::create_dir_all(&self.directory)
            .map_err(|error| Error::StorageError(error.to_string()))?;
        fs::write(self.directory.join(&file_name), bytes)
            .map_err(|error| Error::StorageError(error.to_string()))?;

        tracing::debug!(
            "Stored image '{}' as '{}' ({} bytes)",
            original_name,
            file_name,
            bytes.len()
        );

        Ok(file_name)
    }
}

/// Check whether `bytes` starts with the magic number of a supported image
/// format (JPEG, PNG, GIF or WebP).
pub fn is_image(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8, 0xFF])
        || bytes.starts_with(&[0x89, b'P', b'N', b'G'])
        || bytes.starts_with(b"GIF87a")
        || bytes.starts_with(b"GIF89a")
        || (bytes.starts_with(b"RIFF") && bytes.len() >= 12 && &bytes[8..12] == b"WEBP")
}


#[cfg(test)]
mod image_store_tests {
    use super::ImageStore;

    #[test]
    fn store_writes_file_and_returns_hashed_name() {
        let directory = tempfile::tempdir().expect("Could not create temp directory");
        let store = ImageStore::new(directory.path());
        let bytes = [0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0x02];

        let file_name = store
            .store("photo.JPG", &bytes)
            .expect("Could not store image");

        assert!(file_name.ends_with(".jpg"));
        assert_eq!(file_name, format!("{:x}.jpg", md5::compute(bytes)));

        let written = std::fs::read(directory.path().join(&file_name))
            .expect("Stored image file is missing");
        assert_eq!(written, bytes);
    }

    #[test]
    fn store_without_extension_uses_bare_hash() {
        let directory = tempfile::tempdir().expect("Could not create temp directory");
        let store = ImageStore::new(directory.path());

        let file_name = store.store("upload", &[1, 2, 3]).expect("Could not store image");

        assert!(!file_name.contains('.'));
    }
}
