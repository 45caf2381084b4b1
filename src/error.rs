use thiserror::Error;

/// Errors that abort a conversion call.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid content: {0}")]
    Validation(String),

    #[error("malformed document: {0}")]
    Structural(String),

    #[error("invalid document settings: {0}")]
    Settings(String),

    #[error("json decoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("docx package unreadable: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("xml parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by callers to map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Structural,
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Validation(_) | ConvertError::Settings(_) | ConvertError::Json(_) => {
                ErrorKind::Validation
            }
            ConvertError::Structural(_)
            | ConvertError::Zip(_)
            | ConvertError::Xml(_)
            | ConvertError::Io(_) => ErrorKind::Structural,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// A single block could not be exported; the exporter substitutes a placeholder.
#[derive(Debug, Clone, Error)]
pub enum BlockError {
    #[error("text contains a character not allowed in XML: U+{0:04X}")]
    InvalidXmlChar(u32),
}

/// An image could not be fetched, decoded or stored.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid data uri")]
    DataUri,

    #[error("base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("http fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),

    #[error("image io failed: {0}")]
    Io(#[from] std::io::Error),
}
