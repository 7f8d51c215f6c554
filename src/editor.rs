//! Reviewing alt text before it is written back.
//!
//! The pipeline hands an [`AltTextEditor`] one [`AltEntry`] per image
//! occurrence and gets back the final text for each composite key. The
//! shipped editors are non-interactive: [`AcceptSuggestions`] takes every
//! proposal as is, [`OverrideFile`] layers hand-written alt text from a
//! JSON file on top, and [`InventoryDump`] records what was proposed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::container::Container;
use crate::error::Result;

/// Separator of the composite key parts. Never appears in a bookpath or
/// an index.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// Identity of one image occurrence: image bookpath, document bookpath and
/// the image's 1-based position in that document.
pub fn composite_key(image_bookpath: &str, document_bookpath: &str, index: usize) -> String {
    format!("{image_bookpath}{KEY_SEPARATOR}{document_bookpath}{KEY_SEPARATOR}{index}")
}

/// One image occurrence offered for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AltEntry {
    /// Staged copy of the image, safe to open for previews.
    pub file_path: PathBuf,
    pub image_bookpath: String,
    pub media_type: String,
    /// See [`composite_key`].
    pub key: String,
    /// Current alt text (unescaped), or the metadata candidate when the
    /// document has none.
    pub alt_text: String,
}

/// Alt text chosen by the editor, by composite key.
pub type AltTextChanges = HashMap<String, String>;

/// Something that reviews the proposed alt text.
pub trait AltTextEditor {
    /// Return the final alt text by composite key, or `None` if no changes
    /// were accepted. Keys missing from the result are left unchanged.
    fn review(&mut self, entries: &[AltEntry], thumbnail_width: u32) -> Result<Option<AltTextChanges>>;
}

impl<E: AltTextEditor + ?Sized> AltTextEditor for Box<E> {
    fn review(&mut self, entries: &[AltEntry], thumbnail_width: u32) -> Result<Option<AltTextChanges>> {
        (**self).review(entries, thumbnail_width)
    }
}

/// Accept every proposed alt text, including metadata-derived candidates.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptSuggestions;

impl AltTextEditor for AcceptSuggestions {
    fn review(&mut self, entries: &[AltEntry], _thumbnail_width: u32) -> Result<Option<AltTextChanges>> {
        Ok(Some(
            entries
                .iter()
                .map(|entry| (entry.key.clone(), entry.alt_text.clone()))
                .collect(),
        ))
    }
}

/// One record of an override file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltOverride {
    /// Image bookpath.
    pub image: String,
    /// Bookpath of the document containing the `<img>`.
    pub document: String,
    /// 1-based image position within the document.
    pub index: usize,
    pub alt: String,
}

impl AltOverride {
    pub fn key(&self) -> String {
        composite_key(&self.image, &self.document, self.index)
    }
}

/// Proposals overridden by a JSON array of [`AltOverride`] records.
///
/// ```json
/// [{"image": "OEBPS/Images/map.png", "document": "OEBPS/Text/ch01.xhtml",
///   "index": 1, "alt": "Map of the northern coast"}]
/// ```
#[derive(Debug, Clone, Default)]
pub struct OverrideFile {
    overrides: HashMap<String, String>,
}

impl OverrideFile {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let records: Vec<AltOverride> = serde_json::from_slice(&data)?;
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: impl IntoIterator<Item = AltOverride>) -> Self {
        Self {
            overrides: records
                .into_iter()
                .map(|record| (record.key(), record.alt))
                .collect(),
        }
    }
}

impl AltTextEditor for OverrideFile {
    fn review(&mut self, entries: &[AltEntry], thumbnail_width: u32) -> Result<Option<AltTextChanges>> {
        let mut changes = AcceptSuggestions
            .review(entries, thumbnail_width)?
            .unwrap_or_default();
        for entry in entries {
            if let Some(alt) = self.overrides.get(&entry.key) {
                changes.insert(entry.key.clone(), alt.clone());
            }
        }
        let unmatched = self
            .overrides
            .keys()
            .filter(|key| !changes.contains_key(*key))
            .count();
        if unmatched > 0 {
            log::warn!("{} alt text override(s) match no image in the book", unmatched);
        }
        Ok(Some(changes))
    }
}

/// Write the proposed entries to a JSON file, then defer to another editor.
pub struct InventoryDump<E> {
    inner: E,
    path: PathBuf,
}

impl<E: AltTextEditor> InventoryDump<E> {
    pub fn new(inner: E, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
        }
    }
}

impl<E: AltTextEditor> AltTextEditor for InventoryDump<E> {
    fn review(&mut self, entries: &[AltEntry], thumbnail_width: u32) -> Result<Option<AltTextChanges>> {
        std::fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        self.inner.review(entries, thumbnail_width)
    }
}

/// Temporary copies of every manifest image, laid out by bookpath.
///
/// Editors preview the copies instead of the book itself. The directory is
/// deleted when the staging is dropped, whatever the editor did.
pub struct ImageStaging {
    dir: TempDir,
    media_types: HashMap<String, String>,
}

impl ImageStaging {
    pub fn new<C: Container + ?Sized>(container: &C) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("access-aide").tempdir()?;
        let mut media_types = HashMap::new();

        for id in container.image_ids() {
            let bookpath = container.id_to_bookpath(&id)?;
            // An image that cannot be staged has no staged copy, so its
            // metadata candidate is empty.
            if let Err(e) = stage(container, &id, &staged_path(dir.path(), &bookpath)) {
                log::warn!("cannot stage image {}: {}", bookpath, e);
            }
            media_types.insert(bookpath, container.manifest_item(&id)?.media_type.clone());
        }

        Ok(Self { dir, media_types })
    }

    /// Location of the staged copy of `bookpath`.
    pub fn path_for(&self, bookpath: &str) -> PathBuf {
        staged_path(self.dir.path(), bookpath)
    }

    /// Manifest media type of a staged image.
    pub fn media_type(&self, bookpath: &str) -> Option<&str> {
        self.media_types.get(bookpath).map(String::as_str)
    }
}

fn stage<C: Container + ?Sized>(container: &C, id: &str, path: &Path) -> Result<()> {
    let data = container.read_file(id)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

fn staged_path(root: &Path, bookpath: &str) -> PathBuf {
    bookpath
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "..")
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}
