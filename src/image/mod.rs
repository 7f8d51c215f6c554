//! Alt-text candidates from embedded image metadata.
//!
//! SVG images are described by their top-level `<desc>`. Raster images are
//! searched for an XMP `AltTextAccessibility` property, falling back to the
//! EXIF `ImageDescription` field.

pub mod container;
pub mod exif;
pub mod format;
pub mod svg;
pub mod xmp;

use std::path::Path;

pub use container::{EmbeddedMetadata, embedded_metadata};
pub use format::{MediaFormat, detect_media_format};
pub use xmp::{AltTextMap, base_language, parse_alt_text_map, select_alt_text};

use crate::error::Result;

/// Read an image file and return its alt-text candidate for `lang`.
///
/// Never fails: unreadable files and malformed metadata are logged and
/// yield an empty string, so one bad image cannot stop a run.
pub fn extract_alt_text(path: &Path, lang: &str) -> String {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("cannot read image {}: {}", path.display(), e);
            return String::new();
        }
    };

    let format = detect_media_format(&path.to_string_lossy(), &data);
    match alt_text_from_bytes(format, &data, lang) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("cannot read metadata of {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Alt-text candidate for in-memory image data of a known format.
///
/// Precedence for raster images: XMP entry for `lang`, for its base
/// language, the `x-default` entry, then the EXIF description.
pub fn alt_text_from_bytes(format: MediaFormat, data: &[u8], lang: &str) -> Result<String> {
    if format == MediaFormat::Svg {
        return svg::desc_text(data);
    }

    let meta = embedded_metadata(format, data)?;
    let description = meta.exif.and_then(exif::image_description);

    if let Some(packet) = meta.xmp.as_deref().filter(|p| !p.is_empty()) {
        let map = parse_alt_text_map(packet)?;
        if let Some(text) = select_alt_text(&map, lang) {
            return Ok(text.to_string());
        }
    }

    Ok(description.unwrap_or_default())
}
