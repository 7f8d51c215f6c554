//! Targeted `alt` attribute updates.
//!
//! Images are identified by their 1-based position among the document's
//! `<img>` tags, the same numbering [`transform_document`] uses when it
//! builds the inventory. Positions are recomputed by rescanning rather
//! than stored, so the document must not change between the two passes.
//!
//! [`transform_document`]: super::transform_document

use super::is_image_tag;
use crate::markup::{Token, Tokenizer, xml_encode};

/// Replace the `alt` attribute of the `target_index`-th image.
///
/// `alt_text` is plain text and is escaped here. Every other byte of the
/// document, including all other images, is left untouched. An index past
/// the last image leaves the document unchanged.
///
/// # Examples
///
/// ```
/// use access_aide::transform::patch_alt_text;
///
/// let doc = r#"<p><img src="a.png" alt=""/><img src="b.png" alt=""/></p>"#;
/// assert_eq!(
///     patch_alt_text(doc, 2, "Fish & chips"),
///     r#"<p><img src="a.png" alt=""/><img src="b.png" alt="Fish &amp; chips"/></p>"#
/// );
/// ```
pub fn patch_alt_text(source: &str, target_index: usize, alt_text: &str) -> String {
    let mut out = String::with_capacity(source.len() + alt_text.len());
    let mut image_count = 0;

    for token in Tokenizer::new(source) {
        match token {
            Token::Tag(mut tag) if is_image_tag(&tag) => {
                image_count += 1;
                if image_count == target_index {
                    tag.set_attr("alt", xml_encode(alt_text));
                }
                tag.write_markup(&mut out);
            }
            other => other.write_markup(&mut out),
        }
    }

    out
}
