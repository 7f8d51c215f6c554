//! Package document updates: accessibility metadata and `xml:lang`.

use crate::container::ManifestItem;
use crate::markup::{TagKind, Token, Tokenizer};

/// Metadata inserted into EPUB3 packages.
const EPUB3_ACCESS_META: &[&str] = &[
    "<meta property=\"schema:accessibilitySummary\">This publication conforms to WCAG 2.1 AA.</meta>\n",
    "<meta property=\"schema:accessMode\">textual</meta>\n",
    "<meta property=\"schema:accessMode\">visual</meta>\n",
    "<meta property=\"schema:accessModeSufficient\">textual</meta>\n",
    "<meta property=\"schema:accessibilityFeature\">structuralNavigation</meta>\n",
    "<meta property=\"schema:accessibilityHazard\">none</meta>\n",
];

/// Metadata inserted into EPUB2 packages.
const EPUB2_ACCESS_META: &[&str] = &[
    "<meta name=\"schema:accessibilitySummary\" content=\"This publication conforms to WCAG 2.1 AA.\"/>\n",
    "<meta name=\"schema:accessMode\" content=\"textual\"/>\n",
    "<meta name=\"schema:accessModeSufficient\" content=\"textual\"/>\n",
    "<meta name=\"schema:accessibilityFeature\" content=\"structuralNavigation\"/>\n",
    "<meta name=\"schema:accessibilityHazard\" content=\"none\"/>\n",
];

const ACCESS_PREFIX: &str = "schema:access";

/// What the manifest allows the run to claim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaPolicy {
    /// No audio, video, MathML or scripted content: the fixed
    /// accessibility metadata (and role derivation) may be applied.
    pub allow_metadata: bool,
    /// Manifest id of the EPUB3 navigation document.
    pub nav_id: Option<String>,
}

impl MediaPolicy {
    /// Scan the manifest.
    ///
    /// `mathml` and `scripted` properties only exist in EPUB3, so EPUB2
    /// books are judged by media type alone.
    pub fn from_manifest(manifest: &[ManifestItem], is_epub3: bool) -> Self {
        let mut policy = MediaPolicy {
            allow_metadata: true,
            nav_id: None,
        };

        for item in manifest {
            if item.media_type.starts_with("audio") || item.media_type.starts_with("video") {
                policy.allow_metadata = false;
            }
            if !is_epub3 {
                continue;
            }
            if item.has_property("mathml") || item.has_property("scripted") {
                policy.allow_metadata = false;
            }
            if item.has_property("nav") {
                policy.nav_id = Some(item.id.clone());
            }
        }

        policy
    }
}

/// Result of [`update_metadata`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub xml: String,
    /// Text of the first non-empty `dc:language`.
    pub primary_language: Option<String>,
}

/// Add the accessibility metadata block before `</metadata>`.
///
/// Nothing is inserted when `allowed` is false or the block already
/// carries any `schema:access*` meta, so running this twice is harmless.
/// The first `dc:language` is reported either way.
pub fn update_metadata(metadata_xml: &str, is_epub3: bool, allowed: bool) -> MetadataUpdate {
    let mut out = String::with_capacity(metadata_xml.len() + 512);
    let mut primary_language = None;
    let mut has_access_meta = false;

    for token in Tokenizer::new(metadata_xml) {
        match &token {
            Token::Text { text, path } => {
                if primary_language.is_none() && path.ends_with("dc:language") {
                    let lang = text.trim();
                    if !lang.is_empty() {
                        primary_language = Some(lang.to_string());
                    }
                }
            }
            Token::Tag(tag) => {
                if tag.is("meta") && tag.is_opening() {
                    let declares = |name: &str| {
                        tag.attr(name)
                            .is_some_and(|value| value.starts_with(ACCESS_PREFIX))
                    };
                    if declares("property") || declares("name") {
                        has_access_meta = true;
                    }
                }
                if tag.is("metadata") && tag.kind == TagKind::End && allowed && !has_access_meta {
                    let block = if is_epub3 {
                        EPUB3_ACCESS_META
                    } else {
                        EPUB2_ACCESS_META
                    };
                    block.iter().for_each(|line| out.push_str(line));
                    has_access_meta = true;
                }
            }
        }
        token.write_markup(&mut out);
    }

    MetadataUpdate {
        xml: out,
        primary_language,
    }
}

/// Add `xml:lang` to the `<package>` tag when it has none. An existing
/// value is never replaced.
pub fn update_package_tag(package_tag: &str, language: &str) -> String {
    let mut out = String::with_capacity(package_tag.len() + language.len() + 12);
    for token in Tokenizer::new(package_tag) {
        match token {
            Token::Tag(mut tag) if tag.is("package") && tag.is_opening() => {
                if !tag.has_attr("xml:lang") {
                    tag.set_attr("xml:lang", language);
                }
                tag.write_markup(&mut out);
            }
            other => other.write_markup(&mut out),
        }
    }
    out
}
