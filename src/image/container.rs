//! Locating metadata blocks inside raster image containers.
//!
//! Each container stores XMP and EXIF differently:
//!
//! | Format | XMP                                   | EXIF                  |
//! |--------|---------------------------------------|-----------------------|
//! | PNG    | `iTXt`/`zTXt`/`tEXt` keyword [`PNG_XMP_KEYWORD`] | `eXIf` chunk |
//! | JPEG   | `APP1` prefixed with [`JPEG_XMP_MARKER`] | `APP1` prefixed with `Exif\0\0` |
//! | WebP   | `XMP ` RIFF chunk                     | `EXIF` RIFF chunk     |
//! | TIFF   | IFD0 tag 700                          | the file itself       |

use std::borrow::Cow;
use std::io::Read;

use super::exif::{self, TAG_XMP};
use super::format::MediaFormat;
use crate::error::{Error, Result};

/// Keyword of the PNG text chunk carrying an XMP packet.
pub const PNG_XMP_KEYWORD: &[u8] = b"XML:com.adobe.xmp";

/// Namespace marker that starts a JPEG `APP1` XMP segment, before its NUL.
pub const JPEG_XMP_MARKER: &[u8] = b"http://ns.adobe.com/xap/1.0/";

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Metadata blocks found in an image. Either may be absent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmbeddedMetadata<'a> {
    /// Raw XMP packet (XML bytes).
    pub xmp: Option<Cow<'a, [u8]>>,
    /// TIFF-structured EXIF block, without any `Exif\0\0` header.
    pub exif: Option<&'a [u8]>,
}

/// Find the XMP and EXIF blocks in `data`.
///
/// Formats that cannot carry either (GIF, SVG, unknown) yield an empty
/// result. A structurally broken container is an error.
pub fn embedded_metadata(format: MediaFormat, data: &[u8]) -> Result<EmbeddedMetadata<'_>> {
    match format {
        MediaFormat::Png => png_metadata(data),
        MediaFormat::Jpeg => jpeg_metadata(data),
        MediaFormat::WebP => webp_metadata(data),
        MediaFormat::Tiff => Ok(EmbeddedMetadata {
            xmp: exif::ifd0_value(data, TAG_XMP).map(Cow::Borrowed),
            exif: Some(data),
        }),
        MediaFormat::Gif | MediaFormat::Svg | MediaFormat::Binary => {
            Ok(EmbeddedMetadata::default())
        }
    }
}

fn truncated(format: &str) -> Error {
    Error::InvalidImage(format!("truncated {format} data"))
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn png_metadata(data: &[u8]) -> Result<EmbeddedMetadata<'_>> {
    let mut meta = EmbeddedMetadata::default();
    let mut pos = PNG_SIGNATURE.len();
    if !data.starts_with(PNG_SIGNATURE) {
        return Err(Error::InvalidImage("missing PNG signature".into()));
    }

    while pos < data.len() {
        let header = data.get(pos..pos + 8).ok_or_else(|| truncated("PNG"))?;
        let len = be_u32(&header[0..4]) as usize;
        let kind = &header[4..8];
        let body_start = pos + 8;
        let body = data
            .get(body_start..body_start.checked_add(len).ok_or_else(|| truncated("PNG"))?)
            .ok_or_else(|| truncated("PNG"))?;

        match kind {
            b"iTXt" | b"zTXt" | b"tEXt" if meta.xmp.is_none() => {
                meta.xmp = png_text_xmp(kind, body)?;
            }
            b"eXIf" => meta.exif = Some(exif::strip_exif_header(body)),
            b"IEND" => break,
            _ => {}
        }

        // chunk data is followed by a 4-byte CRC
        pos = body_start + len + 4;
    }

    Ok(meta)
}

/// Decode a PNG text chunk if its keyword names an XMP packet.
fn png_text_xmp<'a>(kind: &[u8], body: &'a [u8]) -> Result<Option<Cow<'a, [u8]>>> {
    let Some(nul) = memchr::memchr(0, body) else {
        return Ok(None);
    };
    if &body[..nul] != PNG_XMP_KEYWORD {
        return Ok(None);
    }
    let rest = &body[nul + 1..];

    match kind {
        b"tEXt" => Ok(Some(Cow::Borrowed(rest))),
        b"zTXt" => {
            // compression method byte, then a zlib stream
            let stream = rest.get(1..).ok_or_else(|| truncated("PNG zTXt"))?;
            Ok(Some(Cow::Owned(inflate(stream)?)))
        }
        _ => {
            // iTXt: compression flag, method, language tag\0, translated keyword\0, text
            let flag = *rest.first().ok_or_else(|| truncated("PNG iTXt"))?;
            let mut text = rest.get(2..).ok_or_else(|| truncated("PNG iTXt"))?;
            for _ in 0..2 {
                let end = memchr::memchr(0, text).ok_or_else(|| truncated("PNG iTXt"))?;
                text = &text[end + 1..];
            }
            if flag == 0 {
                Ok(Some(Cow::Borrowed(text)))
            } else {
                Ok(Some(Cow::Owned(inflate(text)?)))
            }
        }
    }
}

fn inflate(stream: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = flate2::read::ZlibDecoder::new(stream);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

fn jpeg_metadata(data: &[u8]) -> Result<EmbeddedMetadata<'_>> {
    let mut meta = EmbeddedMetadata::default();
    if !data.starts_with(&[0xFF, 0xD8]) {
        return Err(Error::InvalidImage("missing JPEG SOI marker".into()));
    }
    let mut pos = 2;

    loop {
        if data.get(pos) != Some(&0xFF) {
            return Err(Error::InvalidImage(format!("bad JPEG marker at {pos}")));
        }
        // skip fill bytes
        while data.get(pos + 1) == Some(&0xFF) {
            pos += 1;
        }
        let marker = *data.get(pos + 1).ok_or_else(|| truncated("JPEG"))?;
        pos += 2;

        match marker {
            // start of scan / end of image: no more metadata segments follow
            0xDA | 0xD9 => break,
            0x01 | 0xD0..=0xD7 => continue,
            _ => {}
        }

        let len_bytes = data.get(pos..pos + 2).ok_or_else(|| truncated("JPEG"))?;
        let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if len < 2 {
            return Err(Error::InvalidImage("bad JPEG segment length".into()));
        }
        let payload = data.get(pos + 2..pos + len).ok_or_else(|| truncated("JPEG"))?;

        if marker == 0xE1 {
            if let Some(rest) = payload.strip_prefix(JPEG_XMP_MARKER)
                && let Some(packet) = rest.strip_prefix(b"\0")
            {
                meta.xmp.get_or_insert(Cow::Borrowed(packet));
            } else if let Some(tiff) = payload.strip_prefix(b"Exif\0\0") {
                meta.exif.get_or_insert(tiff);
            }
        }

        pos += len;
    }

    Ok(meta)
}

fn webp_metadata(data: &[u8]) -> Result<EmbeddedMetadata<'_>> {
    let mut meta = EmbeddedMetadata::default();
    if data.len() < 12 || !data.starts_with(b"RIFF") || &data[8..12] != b"WEBP" {
        return Err(Error::InvalidImage("missing RIFF/WEBP header".into()));
    }
    let mut pos = 12;

    while pos + 8 <= data.len() {
        let fourcc = &data[pos..pos + 4];
        let len = le_u32(&data[pos + 4..pos + 8]) as usize;
        let body_start = pos + 8;
        let body = data
            .get(body_start..body_start.checked_add(len).ok_or_else(|| truncated("WebP"))?)
            .ok_or_else(|| truncated("WebP"))?;

        match fourcc {
            b"XMP " => meta.xmp = Some(Cow::Borrowed(body)),
            b"EXIF" => meta.exif = Some(exif::strip_exif_header(body)),
            _ => {}
        }

        // chunks are padded to an even length
        pos = body_start + len + (len & 1);
    }

    Ok(meta)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::image::exif::TAG_IMAGE_DESCRIPTION;
    use crate::image::exif::tests::build_tiff;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    pub(crate) fn png_chunk(kind: &[u8], body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(body);
        // CRC is not verified by the reader
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    pub(crate) fn build_png(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        out.extend(png_chunk(b"IHDR", &[0; 13]));
        for chunk in chunks {
            out.extend_from_slice(chunk);
        }
        out.extend(png_chunk(b"IEND", &[]));
        out
    }

    pub(crate) fn itxt(text: &[u8], compressed: bool) -> Vec<u8> {
        let mut body = PNG_XMP_KEYWORD.to_vec();
        body.push(0);
        body.push(compressed as u8);
        body.push(0);
        body.extend_from_slice(b"\0\0");
        if compressed {
            body.extend(zlib(text));
        } else {
            body.extend_from_slice(text);
        }
        png_chunk(b"iTXt", &body)
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    pub(crate) fn jpeg_segment(marker: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, marker];
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    pub(crate) fn build_jpeg(segments: &[Vec<u8>]) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        out.extend(jpeg_segment(0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0"));
        for segment in segments {
            out.extend_from_slice(segment);
        }
        out.extend(jpeg_segment(0xDA, &[0; 10]));
        out.extend_from_slice(&[0x12, 0x34, 0xFF, 0xD9]);
        out
    }

    pub(crate) fn jpeg_xmp(packet: &[u8]) -> Vec<u8> {
        let mut payload = JPEG_XMP_MARKER.to_vec();
        payload.push(0);
        payload.extend_from_slice(packet);
        jpeg_segment(0xE1, &payload)
    }

    pub(crate) fn build_webp(chunks: &[(&[u8], &[u8])]) -> Vec<u8> {
        let mut body = b"WEBP".to_vec();
        for (fourcc, data) in chunks {
            body.extend_from_slice(fourcc);
            body.extend_from_slice(&(data.len() as u32).to_le_bytes());
            body.extend_from_slice(data);
            if data.len() % 2 == 1 {
                body.push(0);
            }
        }
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend(body);
        out
    }

    const PACKET: &[u8] = b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"/>";

    #[test]
    fn test_png_itxt_plain_and_compressed() {
        for compressed in [false, true] {
            let png = build_png(&[itxt(PACKET, compressed)]);
            let meta = embedded_metadata(MediaFormat::Png, &png).unwrap();
            assert_eq!(meta.xmp.as_deref(), Some(PACKET));
            assert_eq!(meta.exif, None);
        }
    }

    #[test]
    fn test_png_text_and_ztxt() {
        let mut text = PNG_XMP_KEYWORD.to_vec();
        text.push(0);
        text.extend_from_slice(PACKET);
        let png = build_png(&[png_chunk(b"tEXt", &text)]);
        let meta = embedded_metadata(MediaFormat::Png, &png).unwrap();
        assert_eq!(meta.xmp.as_deref(), Some(PACKET));

        let mut ztxt = PNG_XMP_KEYWORD.to_vec();
        ztxt.extend_from_slice(&[0, 0]);
        ztxt.extend(zlib(PACKET));
        let png = build_png(&[png_chunk(b"zTXt", &ztxt)]);
        let meta = embedded_metadata(MediaFormat::Png, &png).unwrap();
        assert_eq!(meta.xmp.as_deref(), Some(PACKET));
    }

    #[test]
    fn test_png_ignores_other_keywords() {
        let png = build_png(&[png_chunk(b"tEXt", b"Comment\0hello")]);
        let meta = embedded_metadata(MediaFormat::Png, &png).unwrap();
        assert_eq!(meta, EmbeddedMetadata::default());
    }

    #[test]
    fn test_png_exif_chunk() {
        let tiff = build_tiff(&[(TAG_IMAGE_DESCRIPTION, 2, &b"Harbour at dusk\0"[..])]);
        let png = build_png(&[png_chunk(b"eXIf", &tiff)]);
        let meta = embedded_metadata(MediaFormat::Png, &png).unwrap();
        assert_eq!(meta.exif, Some(&tiff[..]));
    }

    #[test]
    fn test_png_truncated_chunk() {
        let mut png = build_png(&[itxt(PACKET, false)]);
        png.truncate(40);
        assert!(embedded_metadata(MediaFormat::Png, &png).is_err());
    }

    #[test]
    fn test_jpeg_xmp_and_exif() {
        let tiff = build_tiff(&[(TAG_IMAGE_DESCRIPTION, 2, &b"Lighthouse\0"[..])]);
        let mut exif_payload = b"Exif\0\0".to_vec();
        exif_payload.extend_from_slice(&tiff);
        let jpeg = build_jpeg(&[jpeg_segment(0xE1, &exif_payload), jpeg_xmp(PACKET)]);

        let meta = embedded_metadata(MediaFormat::Jpeg, &jpeg).unwrap();
        assert_eq!(meta.xmp.as_deref(), Some(PACKET));
        assert_eq!(meta.exif, Some(&tiff[..]));
    }

    #[test]
    fn test_jpeg_stops_at_scan() {
        let mut jpeg = build_jpeg(&[]);
        // an XMP-looking segment after SOS is entropy data, not metadata
        let eoi = jpeg.len() - 2;
        jpeg.splice(eoi..eoi, jpeg_xmp(PACKET));
        let meta = embedded_metadata(MediaFormat::Jpeg, &jpeg).unwrap();
        assert_eq!(meta.xmp, None);
    }

    #[test]
    fn test_jpeg_extended_xmp_marker_is_not_main_packet() {
        let mut payload = b"http://ns.adobe.com/xmp/extension/\0".to_vec();
        payload.extend_from_slice(PACKET);
        let jpeg = build_jpeg(&[jpeg_segment(0xE1, &payload)]);
        let meta = embedded_metadata(MediaFormat::Jpeg, &jpeg).unwrap();
        assert_eq!(meta.xmp, None);
    }

    #[test]
    fn test_webp_chunks() {
        let tiff = build_tiff(&[(TAG_IMAGE_DESCRIPTION, 2, &b"Tram\0"[..])]);
        let webp = build_webp(&[
            (&b"VP8X"[..], &[0u8; 10][..]),
            (&b"EXIF"[..], &tiff[..]),
            (&b"XMP "[..], PACKET),
        ]);
        let meta = embedded_metadata(MediaFormat::WebP, &webp).unwrap();
        assert_eq!(meta.xmp.as_deref(), Some(PACKET));
        assert_eq!(meta.exif, Some(&tiff[..]));
    }

    #[test]
    fn test_webp_odd_chunk_padding() {
        let webp = build_webp(&[(&b"ICCP"[..], &b"abc"[..]), (&b"XMP "[..], PACKET)]);
        let meta = embedded_metadata(MediaFormat::WebP, &webp).unwrap();
        assert_eq!(meta.xmp.as_deref(), Some(PACKET));
    }

    #[test]
    fn test_tiff_xmp_tag() {
        let tiff = build_tiff(&[(TAG_XMP, 7, PACKET)]);
        let meta = embedded_metadata(MediaFormat::Tiff, &tiff).unwrap();
        assert_eq!(meta.xmp.as_deref(), Some(PACKET));
        assert_eq!(meta.exif, Some(&tiff[..]));
    }

    #[test]
    fn test_formats_without_metadata() {
        let meta = embedded_metadata(MediaFormat::Gif, b"GIF89a").unwrap();
        assert_eq!(meta, EmbeddedMetadata::default());
    }
}
