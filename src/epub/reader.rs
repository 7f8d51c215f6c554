use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::{Read, Seek};
use std::ops::Range;
use zip::ZipArchive;

use crate::container::ManifestItem;
use crate::error::{Error, Result};
use crate::markup::xml_decode;
use crate::util::strip_bom;
use crate::xml::local_name;

/// The parts of the OPF the container needs, with byte spans of the two
/// regions that get rewritten in place.
#[derive(Debug, Clone)]
pub(crate) struct PackageDocument {
    pub version: String,
    pub manifest: Vec<ManifestItem>,
    pub toc_id: Option<String>,
    /// The `<package ...>` start tag.
    pub package_span: Range<usize>,
    /// `<metadata>` through `</metadata>`.
    pub metadata_span: Range<usize>,
}

/// Read every file entry of the archive, in archive order.
pub(crate) fn read_entries<R: Read + Seek>(reader: R) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut contents = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut contents)?;
        entries.push((name, contents));
    }

    Ok(entries)
}

/// Find the OPF path in `META-INF/container.xml`.
pub(crate) fn find_opf_path(container_xml: &[u8]) -> Result<String> {
    let content = String::from_utf8(strip_bom(container_xml).to_vec())?;
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                if let Some(path) = attribute(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Err(Error::InvalidEpub(
        "No rootfile found in container.xml".into(),
    ))
}

/// Parse the OPF package document.
pub(crate) fn parse_package(content: &str) -> Result<PackageDocument> {
    let mut reader = Reader::from_str(content);

    let mut version = String::new();
    let mut manifest = Vec::new();
    let mut toc_id = None;
    let mut package_span = None;
    let mut metadata_start = None;
    let mut metadata_span = None;
    let mut in_manifest = false;

    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"package" if package_span.is_none() => {
                        version = attribute(&e, b"version")?.unwrap_or_default();
                        package_span = Some(start..reader.buffer_position() as usize);
                    }
                    b"metadata" if metadata_start.is_none() => metadata_start = Some(start),
                    b"manifest" => in_manifest = true,
                    b"item" if in_manifest => manifest.extend(manifest_item(&e)?),
                    b"spine" => toc_id = attribute(&e, b"toc")?,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"item" if in_manifest => manifest.extend(manifest_item(&e)?),
                    b"metadata" if metadata_start.is_none() => {
                        metadata_start = Some(start);
                        metadata_span = Some(start..reader.buffer_position() as usize);
                    }
                    b"spine" => toc_id = attribute(&e, b"toc")?,
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"manifest" => in_manifest = false,
                    b"metadata" if metadata_span.is_none() => {
                        if let Some(open) = metadata_start {
                            metadata_span = Some(open..reader.buffer_position() as usize);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok(PackageDocument {
        version,
        manifest,
        toc_id,
        package_span: package_span.ok_or_else(|| Error::MissingElement("package".into()))?,
        metadata_span: metadata_span.ok_or_else(|| Error::MissingElement("metadata".into()))?,
    })
}

fn manifest_item(e: &BytesStart<'_>) -> Result<Option<ManifestItem>> {
    let mut item = ManifestItem::default();

    for attr in e.attributes().flatten() {
        let value = xml_decode(&String::from_utf8(attr.value.to_vec())?);
        match attr.key.as_ref() {
            b"id" => item.id = value,
            b"href" => item.href = value,
            b"media-type" => item.media_type = value,
            b"properties" => item.properties = Some(value),
            _ => {}
        }
    }

    Ok((!item.id.is_empty()).then_some(item))
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(xml_decode(&String::from_utf8(attr.value.to_vec())?)));
        }
    }
    Ok(None)
}
