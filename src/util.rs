//! Text decoding helpers.

use std::borrow::Cow;

use encoding_rs::Encoding;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the encoding named in the XML declaration
/// 3. Falls back to Windows-1252 (common in old ebooks)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    decode_text_with_encoding(bytes).0
}

/// [`decode_text`], also returning the encoding that was used so the text
/// can be written back with [`encode_text`].
pub fn decode_text_with_encoding(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    // Try UTF-8 first (handles BOM automatically)
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return (result, encoding_rs::UTF_8);
    }

    if let Some(name) = extract_xml_encoding(bytes)
        && let Some(encoding) = Encoding::for_label(name.as_bytes())
    {
        let (result, used, _) = encoding.decode(bytes);
        return (result, used);
    }

    // Fallback: Windows-1252 (superset of ISO-8859-1)
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    (result, encoding_rs::WINDOWS_1252)
}

/// Encode text for writing back in the encoding it was read with.
///
/// Characters the encoding cannot represent become numeric character
/// references. UTF-16 labels encode as UTF-8, as `encoding_rs` does.
pub fn encode_text<'a>(text: &'a str, encoding: &'static Encoding) -> Cow<'a, [u8]> {
    let (bytes, _, _) = encoding.encode(text);
    bytes
}

/// Strip UTF-8 BOM (byte order mark) if present
pub fn strip_bom(data: &[u8]) -> &[u8] {
    // UTF-8 BOM: EF BB BF
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Extract encoding from XML declaration.
///
/// Parses `<?xml ... encoding="..." ?>` in the first 100 bytes.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&after_enc[1..value_end]).ok()
}
