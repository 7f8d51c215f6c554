//! # access-aide
//!
//! Accessibility annotation for EPUB publications.
//!
//! ## Features
//!
//! - Adds a minimal schema.org accessibility metadata block to the package
//!   (skipped for books with audio, video, MathML or scripting)
//! - Sets `lang`/`xml:lang` on every content document and fills empty
//!   `<title>`s from the table of contents
//! - Derives ARIA roles from `epub:type` and applies EPUB3 landmark semantics
//! - Guarantees every `<img>` an `alt` attribute and proposes alt text from
//!   embedded XMP/EXIF metadata or SVG `<desc>`
//! - Rewrites only what changes: untouched markup is kept byte-for-byte
//!
//! ## Quick Start
//!
//! ```no_run
//! use access_aide::{AcceptSuggestions, EpubContainer, aide};
//!
//! let mut book = EpubContainer::open("input.epub")?;
//! let report = aide::annotate(&mut book, &mut AcceptSuggestions)?;
//! println!("{} documents, {} images", report.documents, report.images.len());
//! book.save("output.epub")?;
//! # Ok::<(), access_aide::Error>(())
//! ```
//!
//! ## Working with Markup
//!
//! The building blocks work on plain strings:
//!
//! ```
//! use access_aide::nav::NavIndex;
//! use access_aide::transform::{DocumentContext, transform_document};
//!
//! let ctx = DocumentContext {
//!     manifest_id: "c1",
//!     bookpath: "OEBPS/Text/c1.xhtml",
//!     language: "en",
//!     is_epub3: true,
//!     derive_roles: true,
//! };
//! let doc = r#"<html><body><aside epub:type="footnote">1</aside><img src="../Images/a.png"/></body></html>"#;
//! let out = transform_document(doc, &ctx, &NavIndex::default());
//!
//! assert!(out.xhtml.starts_with(r#"<html lang="en" xml:lang="en">"#));
//! assert!(out.xhtml.contains(r#"role="doc-footnote""#));
//! assert_eq!(out.images[0].image_bookpath, "OEBPS/Images/a.png");
//! ```

pub mod aide;
pub mod aria;
pub mod bookpath;
pub mod container;
pub mod editor;
pub mod epub;
pub mod error;
pub mod image;
pub mod markup;
pub mod nav;
pub mod opf;
pub mod prefs;
pub mod transform;
pub(crate) mod util;
pub(crate) mod xml;

pub use aide::{Report, annotate, run};
pub use container::{Container, ManifestItem};
pub use editor::{AcceptSuggestions, AltEntry, AltTextEditor, OverrideFile};
pub use epub::EpubContainer;
pub use error::{Error, Result};
pub use prefs::Prefs;
