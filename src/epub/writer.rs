use std::io::{Seek, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;

const MIMETYPE: &[u8] = b"application/epub+zip";

/// Write archive entries as an EPUB.
///
/// `mimetype` goes first and uncompressed, as the OCF requires; every
/// other entry keeps its position and is deflated.
pub(crate) fn write_entries<'a, W, I>(entries: I, writer: W) -> Result<()>
where
    W: Write + Seek,
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut zip = ZipWriter::new(writer);

    let options_stored =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let options_deflate =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("mimetype", options_stored)?;
    zip.write_all(MIMETYPE)?;

    for (name, data) in entries {
        if name == "mimetype" {
            continue;
        }
        zip.start_file(name, options_deflate)?;
        zip.write_all(data)?;
    }

    zip.finish()?;
    Ok(())
}
