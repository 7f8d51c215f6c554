//! Bookpath resolution.
//!
//! A bookpath is the container-relative path of a resource
//! (`OEBPS/Text/ch01.xhtml`), independent of manifest ids. Links inside
//! documents are relative to the linking document's directory and may be
//! percent-encoded.

use percent_encoding::percent_decode_str;

/// Split an href into its percent-decoded path and optional fragment.
///
/// Any query string is dropped. An empty path refers to the linking
/// document itself.
///
/// # Examples
///
/// ```
/// use access_aide::bookpath::split_href;
///
/// assert_eq!(
///     split_href("ch%2001.xhtml#sec-2"),
///     ("ch 01.xhtml".to_string(), Some("sec-2".to_string()))
/// );
/// assert_eq!(split_href("#note"), (String::new(), Some("note".to_string())));
/// ```
pub fn split_href(href: &str) -> (String, Option<String>) {
    let (rest, fragment) = match href.split_once('#') {
        Some((rest, frag)) => (rest, Some(frag.to_string())),
        None => (href, None),
    };
    let path = rest.split_once('?').map_or(rest, |(p, _)| p);
    let path = percent_decode_str(path).decode_utf8_lossy().into_owned();
    (path, fragment)
}

/// Directory portion of a bookpath, without a trailing slash.
///
/// Returns `""` for resources at the container root.
pub fn start_dir(bookpath: &str) -> &str {
    bookpath.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Resolve `relative` against the directory `start_dir`.
///
/// `.` segments are dropped, `..` pops a directory (never above the
/// container root), and a leading `/` restarts from the root.
///
/// # Examples
///
/// ```
/// use access_aide::bookpath::build_bookpath;
///
/// assert_eq!(build_bookpath("../Images/a.png", "OEBPS/Text"), "OEBPS/Images/a.png");
/// assert_eq!(build_bookpath("./ch1.xhtml", "OEBPS/Text"), "OEBPS/Text/ch1.xhtml");
/// ```
pub fn build_bookpath(relative: &str, start_dir: &str) -> String {
    let mut components: Vec<&str> = if relative.starts_with('/') {
        Vec::new()
    } else {
        start_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            seg => components.push(seg),
        }
    }

    components.join("/")
}

/// Resolve an href found in the document at `from_bookpath`.
///
/// Returns the target bookpath and fragment. A fragment-only href resolves
/// to `from_bookpath` itself.
pub fn resolve_href(href: &str, from_bookpath: &str) -> (String, Option<String>) {
    let (path, fragment) = split_href(href);
    if path.is_empty() {
        return (from_bookpath.to_string(), fragment);
    }
    (build_bookpath(&path, start_dir(from_bookpath)), fragment)
}
