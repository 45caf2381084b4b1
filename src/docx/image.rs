//! Image sources for export: bytes lookup, format sniffing and display size.

use crate::error::AssetError;
use crate::model::ImageMeta;
use crate::style::CssValue;
use crate::units::{Length, Unit, PT_PER_PX};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Turns an Image block `src` into raw bytes.
pub trait ImageResolver {
    fn resolve(&self, src: &str) -> Result<Vec<u8>, AssetError>;
}

/// Data URIs, `http(s)` URLs (blocking fetch) and local paths.
#[derive(Debug, Clone)]
pub struct DefaultImageResolver {
    pub base_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for DefaultImageResolver {
    fn default() -> Self {
        DefaultImageResolver {
            base_dir: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl DefaultImageResolver {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        DefaultImageResolver {
            base_dir: Some(base_dir.into()),
            ..Default::default()
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let resp = client.get(url).send()?.error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }
}

impl ImageResolver for DefaultImageResolver {
    fn resolve(&self, src: &str) -> Result<Vec<u8>, AssetError> {
        let src = src.trim();
        if src.starts_with("data:") {
            return decode_data_uri(src);
        }
        let lower = src.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return self.fetch(src);
        }
        let path = match &self.base_dir {
            Some(base) => base.join(src.trim_start_matches('/')),
            None => PathBuf::from(src),
        };
        Ok(std::fs::read(path)?)
    }
}

/// Only base64 payloads are accepted.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, AssetError> {
    let rest = uri.strip_prefix("data:").ok_or(AssetError::DataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(AssetError::DataUri)?;
    if !header.to_ascii_lowercase().ends_with(";base64") {
        return Err(AssetError::DataUri);
    }
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(cleaned)?)
}

/// Decoded image bytes with their sniffed format and pixel size.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl LoadedImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AssetError> {
        let reader = ImageReader::new(Cursor::new(&bytes)).with_guessed_format()?;
        let format = reader
            .format()
            .ok_or(image::ImageError::Unsupported(
                image::error::ImageFormatHint::Unknown.into(),
            ))?;
        let (width, height) = reader.into_dimensions()?;
        Ok(LoadedImage {
            bytes,
            format,
            width,
            height,
        })
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("png")
    }

    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

fn dimension_px(value: &CssValue, reference_px: f64) -> Option<f64> {
    let px = match value {
        CssValue::Number(n) => *n as f64,
        CssValue::Text(s) => {
            let len = Length::parse(s)?;
            match len.unit {
                Unit::Px | Unit::Bare => len.value,
                Unit::Percent => reference_px * len.value / 100.0,
                _ => len.to_pt()? / PT_PER_PX,
            }
        }
    };
    (px > 0.0).then_some(px)
}

/// Display size in px. Explicit sizes win; a single given side keeps the
/// aspect ratio. The width never exceeds `max_width_px`.
pub fn display_size(meta: Option<&ImageMeta>, natural: (u32, u32), max_width_px: f64) -> (f64, f64) {
    let (nw, nh) = (natural.0.max(1) as f64, natural.1.max(1) as f64);
    let w = meta.and_then(|m| m.width.as_ref()).and_then(|v| dimension_px(v, max_width_px));
    let h = meta.and_then(|m| m.height.as_ref()).and_then(|v| dimension_px(v, nh));
    let (mut w, mut h) = match (w, h) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * nh / nw),
        (None, Some(h)) => (h * nw / nh, h),
        (None, None) => (nw, nh),
    };
    if w > max_width_px {
        h *= max_width_px / w;
        w = max_width_px;
    }
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn data_uri_png_is_decoded_and_sniffed() {
        let uri = format!("data:image/png;base64,{PNG_1X1}");
        let bytes = DefaultImageResolver::default().resolve(&uri).unwrap();
        let img = LoadedImage::from_bytes(bytes).unwrap();
        assert_eq!(img.format, ImageFormat::Png);
        assert_eq!((img.width, img.height), (1, 1));
        assert_eq!(img.extension(), "png");
        assert_eq!(img.content_type(), "image/png");
    }

    #[test]
    fn malformed_data_uris_fail() {
        assert!(matches!(decode_data_uri("data:image/png,abc"), Err(AssetError::DataUri)));
        assert!(matches!(decode_data_uri("data:nocomma"), Err(AssetError::DataUri)));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,@@@"),
            Err(AssetError::Base64(_))
        ));
    }

    #[test]
    fn garbage_bytes_are_not_an_image() {
        assert!(LoadedImage::from_bytes(b"not an image".to_vec()).is_err());
    }

    #[test]
    fn local_paths_resolve_against_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), b"xyz").unwrap();
        let resolver = DefaultImageResolver::with_base_dir(dir.path());
        assert_eq!(resolver.resolve("/a.bin").unwrap(), b"xyz");
        assert!(matches!(resolver.resolve("missing.png"), Err(AssetError::Io(_))));
    }

    #[test]
    fn sizes_keep_aspect_and_clamp() {
        assert_eq!(display_size(None, (200, 100), 600.0), (200.0, 100.0));
        assert_eq!(display_size(None, (1200, 600), 600.0), (600.0, 300.0));
        let meta = ImageMeta {
            width: Some(CssValue::Number(100)),
            height: None,
            alt: None,
        };
        assert_eq!(display_size(Some(&meta), (200, 100), 600.0), (100.0, 50.0));
        let meta = ImageMeta {
            width: Some(CssValue::Text("50%".into())),
            height: Some(CssValue::Text("30pt".into())),
            alt: None,
        };
        assert_eq!(display_size(Some(&meta), (200, 100), 600.0), (300.0, 40.0));
    }
}
