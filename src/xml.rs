//! Small helpers shared by the `quick-xml` based readers.
//!
//! The OPF reader matches elements by [`local_name`]. The XMP and SVG
//! readers also use it, and they pass `Event::GeneralRef` bodies through
//! [`resolve_entity`] to rebuild the text of `rdf:li` and `desc`.

/// Strip a namespace prefix from an element or attribute name.
pub fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve an XML entity reference (the part between `&` and `;`).
///
/// Only the predefined entities and numeric references; anything else
/// yields `None` and is dropped from the text.
pub fn resolve_entity(entity: &str) -> Option<String> {
    let c = match entity {
        "apos" => '\'',
        "quot" => '"',
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        _ => {
            let code = match entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => entity.strip_prefix('#')?.parse().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some(c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"rdf:li"), b"li");
        assert_eq!(local_name(b"desc"), b"desc");
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp").as_deref(), Some("&"));
        assert_eq!(resolve_entity("#233").as_deref(), Some("é"));
        assert_eq!(resolve_entity("#xE9").as_deref(), Some("é"));
        assert_eq!(resolve_entity("#X2192").as_deref(), Some("\u{2192}"));
        assert_eq!(resolve_entity("nbsp"), None);
        assert_eq!(resolve_entity("#xD800"), None);
    }
}
