//! The publication surface the annotation pipeline works against.
//!
//! [`Container`] is everything [`run`](crate::aide::run) needs from a book:
//! manifest queries, bookpath resolution, raw file access and the two
//! pieces of the package document it rewrites. [`EpubContainer`] is the
//! zip-backed implementation; tests can provide their own.
//!
//! [`EpubContainer`]: crate::epub::EpubContainer

use encoding_rs::Encoding;

use crate::error::{Error, Result};
use crate::util::{decode_text, decode_text_with_encoding, encode_text};

/// Oldest host version the pipeline runs against (`YYYYMMDD`).
pub const VERSION_FLOOR: u32 = 20210430;

/// One `<item>` of the OPF manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestItem {
    pub id: String,
    /// `href` as written, relative to the OPF.
    pub href: String,
    pub media_type: String,
    /// Space-separated EPUB3 `properties`, if any.
    pub properties: Option<String>,
}

impl ManifestItem {
    /// Whether `properties` lists `property`.
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == property))
    }

    pub fn is_text(&self) -> bool {
        self.media_type == "application/xhtml+xml"
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// A content document decoded for rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub text: String,
    /// Encoding the document was read with and is written back in.
    pub encoding: &'static Encoding,
}

/// Host query surface for a publication.
pub trait Container {
    /// Host version as `YYYYMMDD`, compared against [`VERSION_FLOOR`].
    fn launcher_version(&self) -> u32;

    /// The package `version` attribute, e.g. `"3.0"` or `"2.0"`.
    fn epub_version(&self) -> &str;

    fn is_epub3(&self) -> bool {
        self.epub_version().starts_with('3')
    }

    /// Manifest items in document order.
    fn manifest(&self) -> &[ManifestItem];

    /// Bookpath (container-relative path) of a manifest item.
    fn id_to_bookpath(&self, id: &str) -> Result<String>;

    /// Manifest id of the EPUB2 NCX (`<spine toc="...">`).
    fn toc_id(&self) -> Option<&str>;

    /// Raw bytes of a manifest item.
    fn read_file(&self, id: &str) -> Result<Vec<u8>>;

    /// Replace the bytes of a manifest item.
    fn write_file(&mut self, id: &str, data: &[u8]) -> Result<()>;

    /// The `<metadata>...</metadata>` block of the OPF.
    fn metadata_xml(&self) -> &str;

    fn set_metadata_xml(&mut self, xml: String);

    /// The `<package ...>` start tag of the OPF.
    fn package_tag(&self) -> &str;

    fn set_package_tag(&mut self, tag: String);

    /// Preferred editor thumbnail width in pixels.
    fn thumbnail_width(&self) -> u32;

    fn set_thumbnail_width(&mut self, width: u32);

    /// Persist preferences changed during the run.
    fn save_prefs(&mut self) -> Result<()>;

    /// Look up a manifest item by id.
    fn manifest_item(&self, id: &str) -> Result<&ManifestItem> {
        self.manifest()
            .iter()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::UnknownManifestId(id.to_string()))
    }

    /// Ids of the XHTML content documents, in manifest order.
    fn text_ids(&self) -> Vec<String> {
        self.manifest()
            .iter()
            .filter(|item| item.is_text())
            .map(|item| item.id.clone())
            .collect()
    }

    /// Ids of the images, in manifest order.
    fn image_ids(&self) -> Vec<String> {
        self.manifest()
            .iter()
            .filter(|item| item.is_image())
            .map(|item| item.id.clone())
            .collect()
    }

    /// A manifest item decoded as text.
    fn read_text(&self, id: &str) -> Result<String> {
        let data = self.read_file(id)?;
        Ok(decode_text(&data).into_owned())
    }

    /// A manifest item decoded for rewriting, remembering its encoding.
    fn read_document(&self, id: &str) -> Result<TextDocument> {
        let data = self.read_file(id)?;
        let (text, encoding) = decode_text_with_encoding(&data);
        Ok(TextDocument {
            text: text.into_owned(),
            encoding,
        })
    }

    /// Write rewritten text back in the document's original encoding.
    fn write_document(&mut self, id: &str, text: &str, encoding: &'static Encoding) -> Result<()> {
        self.write_file(id, &encode_text(text, encoding))
    }
}
