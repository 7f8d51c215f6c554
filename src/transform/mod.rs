//! Streaming document rewrites
//!
//! - Document: language, missing titles, landmark semantics, ARIA roles and
//!   the image inventory, in one pass per content document
//! - Alt text: rewrite the `alt` of a single image found by its position

pub mod alt_text;
pub mod document;

pub use alt_text::patch_alt_text;
pub use document::{DocumentContext, ImageRecord, Transformed, transform_document};

use crate::markup::Tag;

/// Whether a tag counts as an image occurrence.
///
/// Both the inventory scan and the alt-text patch pass number images with
/// this predicate, in document order, starting at 1.
pub(crate) fn is_image_tag(tag: &Tag) -> bool {
    tag.is("img") && tag.is_opening()
}
