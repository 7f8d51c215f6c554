//! Zip-backed [`Container`] for `.epub` files.

mod reader;
mod writer;

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use crate::bookpath::{build_bookpath, split_href, start_dir};
use crate::container::{Container, ManifestItem, VERSION_FLOOR};
use crate::error::{Error, Result};
use crate::prefs::Prefs;
use crate::util::{decode_text_with_encoding, encode_text};

/// An EPUB held in memory.
///
/// The OPF is kept as text: [`set_metadata_xml`] and [`set_package_tag`]
/// replace their regions in place so everything else in the package
/// document survives untouched.
///
/// [`set_metadata_xml`]: Container::set_metadata_xml
/// [`set_package_tag`]: Container::set_package_tag
///
/// # Example
///
/// ```no_run
/// use access_aide::{Container, EpubContainer};
///
/// let book = EpubContainer::open("book.epub")?;
/// println!("EPUB {} with {} manifest items", book.epub_version(), book.manifest().len());
/// # Ok::<(), access_aide::Error>(())
/// ```
pub struct EpubContainer {
    /// Entry names in archive order.
    order: Vec<String>,
    files: HashMap<String, Vec<u8>>,
    opf_path: String,
    /// OPF text before the package tag, the package tag, the text between
    /// it and `<metadata>`, the metadata block, and the rest.
    opf: [String; 5],
    opf_encoding: &'static Encoding,
    version: String,
    manifest: Vec<ManifestItem>,
    toc_id: Option<String>,
    launcher_version: u32,
    prefs: Prefs,
    prefs_path: Option<PathBuf>,
}

impl EpubContainer {
    /// Open an EPUB file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read an EPUB from any [`Read`] + [`Seek`] source.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let entries = reader::read_entries(reader)?;
        let order: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
        let files: HashMap<String, Vec<u8>> = entries.into_iter().collect();

        let container_xml = files
            .get("META-INF/container.xml")
            .ok_or_else(|| Error::InvalidEpub("missing META-INF/container.xml".into()))?;
        let opf_path = reader::find_opf_path(container_xml)?;
        let opf_bytes = files
            .get(&opf_path)
            .ok_or_else(|| Error::InvalidEpub(format!("missing package document {opf_path}")))?;
        let (opf_text, opf_encoding) = decode_text_with_encoding(opf_bytes);
        let opf_text = opf_text.into_owned();

        let package = reader::parse_package(&opf_text)?;
        let (pkg, meta) = (package.package_span, package.metadata_span);
        if pkg.end > meta.start {
            return Err(Error::InvalidEpub("<metadata> precedes <package>".into()));
        }
        let opf = [
            opf_text[..pkg.start].to_string(),
            opf_text[pkg.clone()].to_string(),
            opf_text[pkg.end..meta.start].to_string(),
            opf_text[meta.clone()].to_string(),
            opf_text[meta.end..].to_string(),
        ];

        Ok(Self {
            order,
            files,
            opf_path,
            opf,
            opf_encoding,
            version: package.version,
            manifest: package.manifest,
            toc_id: package.toc_id,
            launcher_version: VERSION_FLOOR,
            prefs: Prefs::default(),
            prefs_path: None,
        })
    }

    /// Use preferences from `path`, saving them back there on
    /// [`save_prefs`](Container::save_prefs).
    pub fn with_prefs_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.prefs = Prefs::load(&path);
        self.prefs_path = Some(path);
        self
    }

    /// Report a different host version.
    pub fn with_launcher_version(mut self, version: u32) -> Self {
        self.launcher_version = version;
        self
    }

    /// Current text of the package document.
    pub fn opf_text(&self) -> String {
        self.opf.concat()
    }

    /// Write the book to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        std::fs::write(path, buffer.into_inner())?;
        Ok(())
    }

    /// Write the book to any [`Write`] + [`Seek`] destination.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let opf_text = self.opf_text();
        let opf = encode_text(&opf_text, self.opf_encoding);
        let entries = self.order.iter().filter_map(|name| {
            if *name == self.opf_path {
                Some((name.as_str(), &*opf))
            } else {
                self.files.get(name).map(|data| (name.as_str(), data.as_slice()))
            }
        });
        writer::write_entries(entries, writer)
    }

    fn bookpath_of(&self, item: &ManifestItem) -> String {
        let (path, _) = split_href(&item.href);
        build_bookpath(&path, start_dir(&self.opf_path))
    }
}

impl Container for EpubContainer {
    fn launcher_version(&self) -> u32 {
        self.launcher_version
    }

    fn epub_version(&self) -> &str {
        &self.version
    }

    fn manifest(&self) -> &[ManifestItem] {
        &self.manifest
    }

    fn id_to_bookpath(&self, id: &str) -> Result<String> {
        Ok(self.bookpath_of(self.manifest_item(id)?))
    }

    fn toc_id(&self) -> Option<&str> {
        self.toc_id.as_deref()
    }

    fn read_file(&self, id: &str) -> Result<Vec<u8>> {
        let bookpath = self.id_to_bookpath(id)?;
        self.files
            .get(&bookpath)
            .cloned()
            .ok_or_else(|| Error::InvalidEpub(format!("{bookpath} is listed in the manifest but missing")))
    }

    fn write_file(&mut self, id: &str, data: &[u8]) -> Result<()> {
        let bookpath = self.id_to_bookpath(id)?;
        if !self.files.contains_key(&bookpath) {
            self.order.push(bookpath.clone());
        }
        self.files.insert(bookpath, data.to_vec());
        Ok(())
    }

    fn metadata_xml(&self) -> &str {
        &self.opf[3]
    }

    fn set_metadata_xml(&mut self, xml: String) {
        self.opf[3] = xml;
    }

    fn package_tag(&self) -> &str {
        &self.opf[1]
    }

    fn set_package_tag(&mut self, tag: String) {
        self.opf[1] = tag;
    }

    fn thumbnail_width(&self) -> u32 {
        self.prefs.thumbnail_width
    }

    fn set_thumbnail_width(&mut self, width: u32) {
        self.prefs.thumbnail_width = width;
    }

    fn save_prefs(&mut self) -> Result<()> {
        match &self.prefs_path {
            Some(path) => self.prefs.save(path),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#;

    const OPF: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:language>en</dc:language></metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="c1" href="Text/chapter%201.xhtml" media-type="application/xhtml+xml"/>
    <item id="img" href="../Images/cover.png" media-type="image/png"/>
  </manifest>
  <spine toc="ncx"><itemref idref="c1"/></spine>
</package>"#;

    fn build_epub() -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in [
            ("mimetype", "application/epub+zip"),
            ("META-INF/container.xml", CONTAINER_XML),
            ("OEBPS/content.opf", OPF),
            ("OEBPS/toc.ncx", "<ncx/>"),
            ("OEBPS/Text/chapter 1.xhtml", "<html/>"),
            ("Images/cover.png", "png"),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_open() {
        let book = EpubContainer::from_reader(Cursor::new(build_epub())).unwrap();
        assert_eq!(book.epub_version(), "2.0");
        assert!(!book.is_epub3());
        assert_eq!(book.toc_id(), Some("ncx"));
        assert_eq!(book.launcher_version(), VERSION_FLOOR);
        assert_eq!(book.text_ids(), ["c1"]);
        assert_eq!(book.image_ids(), ["img"]);
        assert_eq!(book.id_to_bookpath("c1").unwrap(), "OEBPS/Text/chapter 1.xhtml");
        assert_eq!(book.id_to_bookpath("img").unwrap(), "Images/cover.png");
        assert_eq!(book.read_text("c1").unwrap(), "<html/>");
        assert!(matches!(
            book.id_to_bookpath("nope"),
            Err(Error::UnknownManifestId(_))
        ));
    }

    #[test]
    fn test_opf_regions() {
        let book = EpubContainer::from_reader(Cursor::new(build_epub())).unwrap();
        assert_eq!(
            book.package_tag(),
            r#"<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">"#
        );
        assert_eq!(
            book.metadata_xml(),
            r#"<metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:language>en</dc:language></metadata>"#
        );
        assert_eq!(book.opf_text(), OPF);
    }

    #[test]
    fn test_write_round_trip() {
        let mut book = EpubContainer::from_reader(Cursor::new(build_epub())).unwrap();
        book.write_file("c1", b"<html lang=\"en\"/>").unwrap();
        book.set_metadata_xml("<metadata><dc:language>fr</dc:language></metadata>".into());

        let mut out = Cursor::new(Vec::new());
        book.write_to(&mut out).unwrap();
        let reopened = EpubContainer::from_reader(Cursor::new(out.into_inner())).unwrap();

        assert_eq!(reopened.read_file("c1").unwrap(), b"<html lang=\"en\"/>");
        assert_eq!(reopened.read_file("img").unwrap(), b"png");
        assert_eq!(
            reopened.metadata_xml(),
            "<metadata><dc:language>fr</dc:language></metadata>"
        );
        assert_eq!(reopened.package_tag(), book.package_tag());
    }

    #[test]
    fn test_legacy_opf_encoding_round_trip() {
        let opf: &[u8] = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?>\n\
<package version=\"3.0\"><metadata><dc:title>Caf\xe9</dc:title><dc:language>fr</dc:language></metadata>\
<manifest/></package>";
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in [
            ("mimetype", b"application/epub+zip".as_slice()),
            ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
            ("OEBPS/content.opf", opf),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        let bytes = zip.finish().unwrap().into_inner();

        let mut book = EpubContainer::from_reader(Cursor::new(bytes)).unwrap();
        assert!(book.metadata_xml().contains("<dc:title>Caf\u{e9}</dc:title>"));
        let tag = book.package_tag().replace('>', " xml:lang=\"fr\">");
        book.set_package_tag(tag);

        let mut out = Cursor::new(Vec::new());
        book.write_to(&mut out).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(out.into_inner())).unwrap();
        let mut written = Vec::new();
        archive.by_name("OEBPS/content.opf").unwrap().read_to_end(&mut written).unwrap();
        let expected: &[u8] = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?>\n\
<package version=\"3.0\" xml:lang=\"fr\"><metadata><dc:title>Caf\xe9</dc:title><dc:language>fr</dc:language></metadata>\
<manifest/></package>";
        assert_eq!(written, expected);
    }

    #[test]
    fn test_prefs_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut book = EpubContainer::from_reader(Cursor::new(build_epub()))
            .unwrap()
            .with_prefs_file(&path);
        assert_eq!(book.thumbnail_width(), 500);

        book.set_thumbnail_width(240);
        book.save_prefs().unwrap();
        assert_eq!(Prefs::load(&path).thumbnail_width, 240);
    }

    #[test]
    fn test_missing_container_xml() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("mimetype", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        assert!(matches!(
            EpubContainer::from_reader(Cursor::new(bytes)),
            Err(Error::InvalidEpub(_))
        ));
    }
}
