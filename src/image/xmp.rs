//! Alt text from the IPTC `AltTextAccessibility` XMP property.
//!
//! The property is a language alternative (`rdf:Alt`) whose `rdf:li` items
//! carry an `xml:lang` attribute:
//!
//! ```xml
//! <Iptc4xmpCore:AltTextAccessibility>
//!   <rdf:Alt>
//!     <rdf:li xml:lang="x-default">A lighthouse at dusk</rdf:li>
//!     <rdf:li xml:lang="fr-FR">Un phare au crépuscule</rdf:li>
//!   </rdf:Alt>
//! </Iptc4xmpCore:AltTextAccessibility>
//! ```

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::Result;
use crate::util::strip_bom;
use crate::xml::{local_name, resolve_entity};

/// Language tag to alt text.
pub type AltTextMap = HashMap<String, String>;

/// Key used for items without an `xml:lang` attribute.
pub const DEFAULT_LANGUAGE: &str = "x-default";

/// Two-letter base of a regional language tag (`"en-GB"` gives `"en"`).
///
/// Bare codes and tags without a `-`/`_` at position two have no base.
pub fn base_language(lang: &str) -> Option<&str> {
    let bytes = lang.as_bytes();
    if bytes.len() > 3 && matches!(bytes[2], b'-' | b'_') {
        lang.get(..2)
    } else {
        None
    }
}

/// Build the language map from the first `AltTextAccessibility` element of
/// an XMP packet.
///
/// Every regional entry is also registered under its base language, unless
/// the packet lists that base language explicitly. A packet without the
/// property yields an empty map.
pub fn parse_alt_text_map(xmp: &[u8]) -> Result<AltTextMap> {
    let content = String::from_utf8_lossy(strip_bom(xmp));
    let mut reader = Reader::from_str(&content);

    let mut explicit = AltTextMap::new();
    let mut derived = AltTextMap::new();

    let mut depth = 0usize;
    let mut property_depth: Option<usize> = None;
    // (language, text, depth) of the list item being read
    let mut item: Option<(String, String, usize)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let name = e.name();
                let local = local_name(name.as_ref());
                if property_depth.is_none() && local == b"AltTextAccessibility" {
                    property_depth = Some(depth);
                } else if property_depth.is_some() && item.is_none() && local == b"li" {
                    item = Some((item_language(&e), String::new(), depth));
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                if property_depth.is_some() && item.is_none() && local_name(name.as_ref()) == b"li"
                {
                    explicit.insert(item_language(&e), String::new());
                }
            }
            Event::Text(e) => {
                if let Some((_, text, _)) = item.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if let Some((_, text, _)) = item.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if let Some((_, text, _)) = item.as_mut()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    text.push_str(&resolved);
                }
            }
            Event::End(_) => {
                if item.as_ref().is_some_and(|(_, _, d)| *d == depth)
                    && let Some((lang, text, _)) = item.take()
                {
                    if let Some(base) = base_language(&lang) {
                        derived.entry(base.to_string()).or_insert_with(|| text.clone());
                    }
                    explicit.insert(lang, text);
                }
                if property_depth == Some(depth) {
                    break;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    for (lang, text) in derived {
        explicit.entry(lang).or_insert(text);
    }
    Ok(explicit)
}

fn item_language(e: &quick_xml::events::BytesStart<'_>) -> String {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"xml:lang")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

/// Pick the alt text for `lang`: exact tag, then its base language, then
/// the `x-default` entry.
pub fn select_alt_text<'m>(map: &'m AltTextMap, lang: &str) -> Option<&'m str> {
    map.get(lang)
        .or_else(|| base_language(lang).and_then(|base| map.get(base)))
        .or_else(|| map.get(DEFAULT_LANGUAGE))
        .map(String::as_str)
}
