//! Persisting images extracted from an imported package.

use crate::error::AssetError;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Accepts extracted image bytes under a generated file name and returns the
/// path Image blocks should reference.
pub trait ImageStore {
    fn store(&mut self, filename: &str, bytes: &[u8]) -> Result<String, AssetError>;
}

/// File extension (with dot) for an image content type; PNG when unknown.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/webp" => ".webp",
        "image/tiff" => ".tiff",
        "image/x-emf" | "image/emf" => ".emf",
        "image/x-wmf" | "image/wmf" => ".wmf",
        _ => ".png",
    }
}

/// `{8 hex digits}{ext}`.
pub fn generate_filename(content_type: &str) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", &uuid[..8], extension_for(content_type))
}

/// Keeps images in memory; paths are `{prefix}/{filename}`.
#[derive(Debug, Clone)]
pub struct MemoryImageStore {
    pub prefix: String,
    pub images: BTreeMap<String, Vec<u8>>,
}

impl Default for MemoryImageStore {
    fn default() -> Self {
        MemoryImageStore {
            prefix: "images".to_string(),
            images: BTreeMap::new(),
        }
    }
}

impl ImageStore for MemoryImageStore {
    fn store(&mut self, filename: &str, bytes: &[u8]) -> Result<String, AssetError> {
        self.images.insert(filename.to_string(), bytes.to_vec());
        Ok(format!("{}/{filename}", self.prefix.trim_end_matches('/')))
    }
}

/// Writes images into `dir` and returns `{url_prefix}/{filename}`.
#[derive(Debug, Clone)]
pub struct DirImageStore {
    pub dir: PathBuf,
    pub url_prefix: String,
}

impl DirImageStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        DirImageStore {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        }
    }
}

impl ImageStore for DirImageStore {
    fn store(&mut self, filename: &str, bytes: &[u8]) -> Result<String, AssetError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.dir.join(filename), bytes)?;
        Ok(format!("{}/{filename}", self.url_prefix.trim_end_matches('/')))
    }
}
