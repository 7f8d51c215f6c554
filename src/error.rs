//! Error types for access-aide operations.

use thiserror::Error;

/// Errors that can occur while annotating a publication.
///
/// Only the conditions that abort a run surface here. Per-image extraction
/// problems are logged and degrade to an empty alt-text candidate instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("Missing required element: {0}")]
    MissingElement(String),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Unknown manifest id: {0}")]
    UnknownManifestId(String),

    #[error("host version {found} is older than the supported floor {required}")]
    UnsupportedHost { found: u32, required: u32 },

    #[error("nav property missing from the opf manifest properties")]
    MissingNav,

    #[error("at least one dc:language must be specified in the opf")]
    MissingLanguage,

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
