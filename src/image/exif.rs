//! Minimal TIFF/EXIF reader.
//!
//! Reads entries from the first image file directory (IFD0) of a TIFF
//! structure. That covers both standalone TIFF files and the EXIF blocks
//! embedded in JPEG `APP1`, PNG `eXIf` and WebP `EXIF` chunks, which use the
//! same layout.

/// EXIF `ImageDescription` (ASCII).
pub const TAG_IMAGE_DESCRIPTION: u16 = 270;
/// TIFF `XMLPacket`: an embedded XMP packet.
pub const TAG_XMP: u16 = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16(self, b: &[u8]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes([b[0], b[1]]),
            ByteOrder::Big => u16::from_be_bytes([b[0], b[1]]),
        }
    }

    fn u32(self, b: &[u8]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            ByteOrder::Big => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        }
    }
}

/// Size in bytes of one value of a TIFF field type.
fn type_size(field_type: u16) -> Option<usize> {
    match field_type {
        1 | 2 | 6 | 7 => Some(1), // BYTE, ASCII, SBYTE, UNDEFINED
        3 | 8 => Some(2),         // SHORT, SSHORT
        4 | 9 | 11 => Some(4),    // LONG, SLONG, FLOAT
        5 | 10 | 12 => Some(8),   // RATIONAL, SRATIONAL, DOUBLE
        _ => None,
    }
}

/// Return the raw value bytes of `tag` in IFD0, or `None` if the structure
/// is malformed or the tag is absent.
pub fn ifd0_value(tiff: &[u8], tag: u16) -> Option<&[u8]> {
    if tiff.len() < 8 {
        return None;
    }
    let order = match &tiff[0..4] {
        b"II*\0" => ByteOrder::Little,
        b"MM\0*" => ByteOrder::Big,
        _ => return None,
    };
    let ifd = order.u32(&tiff[4..8]) as usize;
    let count = order.u16(tiff.get(ifd..ifd + 2)?) as usize;

    for i in 0..count {
        let entry = tiff.get(ifd + 2 + i * 12..ifd + 2 + (i + 1) * 12)?;
        if order.u16(&entry[0..2]) != tag {
            continue;
        }
        let field_type = order.u16(&entry[2..4]);
        let value_count = order.u32(&entry[4..8]) as usize;
        let size = type_size(field_type)?.checked_mul(value_count)?;
        return if size <= 4 {
            Some(&entry[8..8 + size])
        } else {
            let offset = order.u32(&entry[8..12]) as usize;
            tiff.get(offset..offset.checked_add(size)?)
        };
    }
    None
}

/// EXIF `ImageDescription`, with trailing NULs and whitespace removed.
pub fn image_description(tiff: &[u8]) -> Option<String> {
    let raw = ifd0_value(tiff, TAG_IMAGE_DESCRIPTION)?;
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_end_matches('\0').trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Strip the `Exif\0\0` header that precedes the TIFF structure in JPEG
/// `APP1` segments (and in some WebP `EXIF` chunks).
pub fn strip_exif_header(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"Exif\0\0").unwrap_or(data)
}
