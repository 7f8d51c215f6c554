//! The annotation pipeline.
//!
//! Order matters: the package document is checked and updated first, the
//! navigation is indexed before any content document is rewritten, and
//! alt text is patched only after every document has been transformed.

use crate::container::{Container, VERSION_FLOOR};
use crate::editor::{AltEntry, AltTextEditor, ImageStaging, composite_key};
use crate::error::{Error, Result};
use crate::image::{MediaFormat, extract_alt_text};
use crate::markup::xml_decode;
use crate::nav::{NavIndex, index_navigation};
use crate::opf::{MediaPolicy, update_metadata, update_package_tag};
use crate::transform::{DocumentContext, ImageRecord, patch_alt_text, transform_document};

/// What a successful run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub primary_language: String,
    /// Accessibility metadata and role derivation were permitted.
    pub metadata_allowed: bool,
    pub documents: usize,
    /// Every image occurrence, in document order.
    pub images: Vec<ImageRecord>,
    /// Number of `alt` attributes rewritten after review.
    pub alt_updates: usize,
}

/// Run the pipeline and return a process status: `0` on success, `1` when
/// a precondition fails or the book cannot be read or written.
pub fn run<C, E>(container: &mut C, editor: &mut E) -> i32
where
    C: Container + ?Sized,
    E: AltTextEditor + ?Sized,
{
    match annotate(container, editor) {
        Ok(_) => 0,
        Err(e) => {
            log::error!("Error: {}", e);
            1
        }
    }
}

/// Annotate a publication in place.
pub fn annotate<C, E>(container: &mut C, editor: &mut E) -> Result<Report>
where
    C: Container + ?Sized,
    E: AltTextEditor + ?Sized,
{
    let found = container.launcher_version();
    if found < VERSION_FLOOR {
        return Err(Error::UnsupportedHost {
            found,
            required: VERSION_FLOOR,
        });
    }

    let is_epub3 = container.is_epub3();
    log::info!("Processing an epub with version: {}", container.epub_version());

    let policy = MediaPolicy::from_manifest(container.manifest(), is_epub3);
    let nav_id = match (&policy.nav_id, is_epub3) {
        (Some(id), _) => Some(id.clone()),
        (None, true) => return Err(Error::MissingNav),
        (None, false) => None,
    };
    if !policy.allow_metadata {
        log::warn!(
            "accessibility metadata will not be added due to use of video, audio, mathml, or javascript"
        );
    } else {
        log::info!("Updating the OPF with accessibility schema");
    }

    let update = update_metadata(container.metadata_xml(), is_epub3, policy.allow_metadata);
    container.set_metadata_xml(update.xml);
    let language = update.primary_language.ok_or(Error::MissingLanguage)?;

    if is_epub3 {
        let tag = update_package_tag(container.package_tag(), &language);
        container.set_package_tag(tag);
    }

    let nav = match nav_id {
        Some(id) => {
            let bookpath = container.id_to_bookpath(&id)?;
            index_navigation(&container.read_text(&id)?, &bookpath, true)
        }
        None => match container.toc_id().map(str::to_string) {
            Some(id) => {
                let bookpath = container.id_to_bookpath(&id)?;
                index_navigation(&container.read_text(&id)?, &bookpath, false)
            }
            None => {
                log::warn!("no NCX table of contents; titles cannot be filled in");
                NavIndex::default()
            }
        },
    };

    log::info!("Processing all xhtml files to add accessibility features");
    let mut report = Report {
        metadata_allowed: policy.allow_metadata,
        ..Default::default()
    };
    for id in container.text_ids() {
        let bookpath = container.id_to_bookpath(&id)?;
        log::info!("   ... updating: {} with manifest id: {}", bookpath, id);

        let ctx = DocumentContext {
            manifest_id: &id,
            bookpath: &bookpath,
            language: &language,
            is_epub3,
            derive_roles: is_epub3 && policy.allow_metadata,
        };
        let source = container.read_document(&id)?;
        let transformed = transform_document(&source.text, &ctx, &nav);
        container.write_document(&id, &transformed.xhtml, source.encoding)?;
        report.images.extend(transformed.images);
        report.documents += 1;
    }

    if !report.images.is_empty() {
        report.alt_updates = review_alt_text(container, editor, &report.images, &language)?;
    }

    log::info!("Updating Complete");
    container.save_prefs()?;
    report.primary_language = language;
    Ok(report)
}

/// Offer every image to the editor and patch the ones whose alt text changed.
fn review_alt_text<C, E>(
    container: &mut C,
    editor: &mut E,
    images: &[ImageRecord],
    language: &str,
) -> Result<usize>
where
    C: Container + ?Sized,
    E: AltTextEditor + ?Sized,
{
    log::info!("Collecting image alt text for review");

    let changes = {
        let staging = ImageStaging::new(&*container)?;
        let entries: Vec<AltEntry> = images
            .iter()
            .map(|record| alt_entry(&staging, record, language))
            .collect();
        editor.review(&entries, container.thumbnail_width())?
        // staging removed here
    };

    let Some(changes) = changes else {
        log::info!("no alt text changes accepted");
        return Ok(0);
    };

    log::info!("Updating any changed alt attributes for img tags");
    let mut updated = 0;
    for record in images {
        let key = composite_key(&record.image_bookpath, &record.document_bookpath, record.index);
        let Some(alt) = changes.get(&key) else {
            continue;
        };
        if xml_decode(&record.alt_text) == *alt {
            continue;
        }
        log::info!(
            "    ... alt text needs to be updated in: {} {} {}",
            record.document_bookpath,
            record.src,
            alt
        );
        let source = container.read_document(&record.manifest_id)?;
        let patched = patch_alt_text(&source.text, record.index, alt);
        container.write_document(&record.manifest_id, &patched, source.encoding)?;
        updated += 1;
    }

    Ok(updated)
}

fn alt_entry(staging: &ImageStaging, record: &ImageRecord, language: &str) -> AltEntry {
    log::info!(
        "   ... {} #{} src: {} alt text: {}",
        record.document_bookpath,
        record.index,
        record.src,
        record.alt_text
    );

    let file_path = staging.path_for(&record.image_bookpath);
    let alt_text = if record.alt_text.is_empty() {
        extract_alt_text(&file_path, language)
    } else {
        xml_decode(&record.alt_text)
    };
    let media_type = staging
        .media_type(&record.image_bookpath)
        .unwrap_or_else(|| {
            log::warn!("{} is not a manifest image", record.image_bookpath);
            MediaFormat::Binary.mime_type()
        })
        .to_string();

    AltEntry {
        file_path,
        image_bookpath: record.image_bookpath.clone(),
        media_type,
        key: composite_key(&record.image_bookpath, &record.document_bookpath, record.index),
        alt_text,
    }
}
