//! Lossless markup token streams.
//!
//! - Tokenizer: splits XHTML/XML source into text runs and tag events,
//!   tracking the dot-joined ancestor path of every event
//! - Tokens: tag events with ordered, raw attribute values that serialize
//!   back to their original bytes unless modified
//! - Attribute utilities: multi-valued attribute handling and XML escaping

mod attr;
mod token;
mod tokenizer;

pub use attr::{merge_values, split_values, xml_decode, xml_encode};
pub use token::{Attributes, Tag, TagKind, Token};
pub use tokenizer::Tokenizer;

/// Tokenize `source` and concatenate every token's serialization.
///
/// The result equals the input byte-for-byte; useful as a baseline when
/// checking which parts of a document a transform actually touched.
pub fn reserialize(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for token in Tokenizer::new(source) {
        token.write_markup(&mut out);
    }
    out
}
