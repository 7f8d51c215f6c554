//! Image format detection.

/// Image container formats found in ebooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    /// SVG image (vector, XML text)
    Svg,
    WebP,
    Tiff,
    /// Unknown/binary format
    Binary,
}

impl MediaFormat {
    /// Get the MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Svg => "image/svg+xml",
            MediaFormat::WebP => "image/webp",
            MediaFormat::Tiff => "image/tiff",
            MediaFormat::Binary => "application/octet-stream",
        }
    }
}

/// Detect the image format from a path and/or raw bytes.
///
/// Only SVG is decided by extension, since it has no reliable magic bytes;
/// raster containers are identified by their signatures so misnamed files
/// are still parsed correctly.
pub fn detect_media_format(path: &str, data: &[u8]) -> MediaFormat {
    if data.starts_with(&[0xFF, 0xD8]) {
        return MediaFormat::Jpeg;
    }
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return MediaFormat::Png;
    }
    if data.starts_with(b"GIF8") {
        return MediaFormat::Gif;
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return MediaFormat::WebP;
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return MediaFormat::Tiff;
    }

    let path_lower = path.to_lowercase();
    if path_lower.ends_with(".svg") {
        return MediaFormat::Svg;
    }

    MediaFormat::Binary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_magic_bytes() {
        assert_eq!(detect_media_format("x", &[0xFF, 0xD8, 0xFF, 0xE0]), MediaFormat::Jpeg);
        assert_eq!(
            detect_media_format("x", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            MediaFormat::Png
        );
        assert_eq!(detect_media_format("x", b"GIF89a"), MediaFormat::Gif);
        assert_eq!(detect_media_format("x", b"RIFF\0\0\0\0WEBPVP8 "), MediaFormat::WebP);
        assert_eq!(detect_media_format("x", b"II*\0\x08\0\0\0"), MediaFormat::Tiff);
        assert_eq!(detect_media_format("x", b"MM\0*\0\0\0\x08"), MediaFormat::Tiff);
    }

    #[test]
    fn test_magic_bytes_win_over_extension() {
        assert_eq!(
            detect_media_format("cover.jpg", b"\x89PNG\r\n\x1a\n"),
            MediaFormat::Png
        );
    }

    #[test]
    fn test_svg_by_extension() {
        assert_eq!(detect_media_format("Images/fig.SVG", b"<svg/>"), MediaFormat::Svg);
        assert_eq!(detect_media_format("unknown", b"<svg/>"), MediaFormat::Binary);
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(MediaFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(MediaFormat::Svg.mime_type(), "image/svg+xml");
        assert_eq!(MediaFormat::Tiff.mime_type(), "image/tiff");
    }
}
