//! SVG `<desc>` lookup.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::Result;
use crate::util::strip_bom;
use crate::xml::{local_name, resolve_entity};

/// Text of the first `<desc>` that is a direct child of the root element,
/// or an empty string when there is none.
///
/// Descriptions of nested shapes and groups describe parts of the image
/// rather than the image as a whole and are skipped.
pub fn desc_text(svg: &[u8]) -> Result<String> {
    let content = String::from_utf8_lossy(strip_bom(svg));
    let mut reader = Reader::from_str(&content);

    let mut depth = 0usize;
    let mut desc: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                if depth == 2 && desc.is_none() && local_name(e.name().as_ref()) == b"desc" {
                    desc = Some(String::new());
                }
            }
            Event::Empty(e) => {
                if depth == 1 && local_name(e.name().as_ref()) == b"desc" {
                    return Ok(String::new());
                }
            }
            Event::Text(e) => {
                if let Some(text) = desc.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if let Some(text) = desc.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if let Some(text) = desc.as_mut()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    text.push_str(&resolved);
                }
            }
            Event::End(_) => {
                if depth == 2
                    && let Some(text) = desc.take()
                {
                    return Ok(text);
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_desc() {
        let svg = br#"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
  <title>Chart</title>
  <desc>Sales rose &amp; fell</desc>
  <rect width="10" height="10"/>
</svg>"#;
        assert_eq!(desc_text(svg).unwrap(), "Sales rose & fell");
    }

    #[test]
    fn test_nested_desc_is_skipped() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg">
  <g><desc>One bar</desc><rect/></g>
  <desc>The whole chart</desc>
</svg>"#;
        assert_eq!(desc_text(svg).unwrap(), "The whole chart");
    }

    #[test]
    fn test_prefixed_desc() {
        let svg = br#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:desc>Map</svg:desc></svg:svg>"#;
        assert_eq!(desc_text(svg).unwrap(), "Map");
    }

    #[test]
    fn test_no_desc() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><rect/></svg>"#;
        assert_eq!(desc_text(svg).unwrap(), "");
        assert_eq!(desc_text(b"<svg><desc/></svg>").unwrap(), "");
    }

    #[test]
    fn test_malformed_svg_is_error() {
        assert!(desc_text(b"<svg><desc>open</svg>").is_err());
    }
}
