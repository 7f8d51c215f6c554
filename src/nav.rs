//! Navigation indexing.
//!
//! Builds the per-book lookup tables consumed by the document transformer:
//! a title for each content document (from the EPUB3 nav `toc` or the EPUB2
//! NCX) and, for EPUB3, the landmark `epub:type` that applies to a fragment
//! of each document.

use std::collections::HashMap;

use crate::bookpath::resolve_href;
use crate::markup::{TagKind, Token, Tokenizer, split_values};

/// Document bookpath -> display title.
///
/// Titles are kept as they appear in the navigation markup (entities still
/// escaped) so they can be injected into a `<title>` element verbatim.
pub type TitleMap = HashMap<String, String>;

/// Document bookpath -> landmark applying to that document.
pub type LandmarkMap = HashMap<String, Landmark>;

/// How a landmark locates its target inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// The element whose `id` equals the landmark's fragment.
    ById,
}

/// A landmark entry from the EPUB3 nav.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landmark {
    pub locator: Locator,
    pub fragment: String,
    pub epub_type: String,
}

/// Lookup tables built once per book. Read-only after indexing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavIndex {
    pub titles: TitleMap,
    pub landmarks: LandmarkMap,
}

impl NavIndex {
    pub fn title(&self, bookpath: &str) -> Option<&str> {
        self.titles.get(bookpath).map(String::as_str)
    }

    pub fn landmark(&self, bookpath: &str) -> Option<&Landmark> {
        self.landmarks.get(bookpath)
    }
}

/// Index the navigation source of a book: the EPUB3 nav document when
/// `is_epub3`, the NCX otherwise.
pub fn index_navigation(source: &str, bookpath: &str, is_epub3: bool) -> NavIndex {
    if is_epub3 {
        index_nav(source, bookpath)
    } else {
        index_ncx(source, bookpath)
    }
}

/// Which kind of `<nav>` the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NavSection {
    None,
    Toc,
    Landmarks,
}

/// Index an EPUB3 navigation document.
///
/// - `toc` nav: the text of each `<a href>` becomes the title of the linked
///   document; the first title per document wins, so later sub-heading links
///   into the same file are ignored.
/// - `landmarks` nav: each `<a epub:type href="doc#frag">` records a landmark
///   for `doc`. Links without a fragment are ignored. A later landmark for
///   the same document replaces an earlier one.
/// - The first `<h1>` of the nav document titles the nav document itself.
pub fn index_nav(source: &str, nav_bookpath: &str) -> NavIndex {
    let mut index = NavIndex::default();
    let mut section = NavSection::None;
    // Resolved target of the toc link whose label is being collected.
    let mut pending_link: Option<String> = None;
    let mut label = String::new();
    let mut h1_text: Option<String> = None;
    let mut nav_title_done = false;

    for token in Tokenizer::new(source) {
        match token {
            Token::Text { text, .. } => {
                if pending_link.is_some() {
                    label.push_str(&text);
                }
                if let Some(h1) = h1_text.as_mut() {
                    h1.push_str(&text);
                }
            }
            Token::Tag(tag) => {
                if tag.is("nav") {
                    section = match tag.kind {
                        TagKind::Begin => {
                            let types = split_values(tag.attr("epub:type"));
                            if types.iter().any(|t| t == "toc") {
                                NavSection::Toc
                            } else if types.iter().any(|t| t == "landmarks") {
                                NavSection::Landmarks
                            } else {
                                NavSection::None
                            }
                        }
                        _ => NavSection::None,
                    };
                    continue;
                }

                if tag.is("h1") && !nav_title_done {
                    match tag.kind {
                        TagKind::Begin => h1_text = Some(String::new()),
                        TagKind::End => {
                            if let Some(text) = h1_text.take() {
                                let text = collapse_whitespace(&text);
                                if !text.is_empty() {
                                    index
                                        .titles
                                        .entry(nav_bookpath.to_string())
                                        .or_insert(text);
                                    nav_title_done = true;
                                }
                            }
                        }
                        _ => {}
                    }
                }

                if !tag.is("a") {
                    continue;
                }
                match (section, tag.kind) {
                    (NavSection::Toc, TagKind::Begin) => {
                        if let Some(href) = tag.attr("href") {
                            let (bookpath, _) = resolve_href(href, nav_bookpath);
                            pending_link = Some(bookpath);
                            label.clear();
                        }
                    }
                    (NavSection::Toc, TagKind::End) => {
                        if let Some(bookpath) = pending_link.take() {
                            let title = collapse_whitespace(&label);
                            if !title.is_empty() {
                                index.titles.entry(bookpath).or_insert(title);
                            }
                        }
                    }
                    (NavSection::Landmarks, TagKind::Begin | TagKind::Single) => {
                        if let (Some(href), Some(epub_type)) =
                            (tag.attr("href"), tag.attr("epub:type"))
                        {
                            let (bookpath, fragment) = resolve_href(href, nav_bookpath);
                            // epub:type on body tags is strongly discouraged, so
                            // whole-document landmarks are skipped.
                            if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
                                index.landmarks.insert(
                                    bookpath,
                                    Landmark {
                                        locator: Locator::ById,
                                        fragment,
                                        epub_type: epub_type.to_string(),
                                    },
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    index
}

/// Index an EPUB2 NCX document.
///
/// Each `navPoint/content[@src]` maps its target document to the most
/// recent `navLabel` text; the first label per document wins.
pub fn index_ncx(source: &str, ncx_bookpath: &str) -> NavIndex {
    let mut index = NavIndex::default();
    let mut nav_label: Option<String> = None;

    for token in Tokenizer::new(source) {
        match token {
            Token::Text { text, path } => {
                if path.ends_with("navpoint.navlabel.text") {
                    let text = text.trim();
                    if !text.is_empty() {
                        nav_label = Some(text.to_string());
                    }
                }
            }
            Token::Tag(tag) => {
                if tag.is("content") && tag.is_opening() && tag.path.ends_with("navpoint") {
                    if let Some(src) = tag.attr("src") {
                        let (bookpath, _) = resolve_href(src, ncx_bookpath);
                        if let Some(label) = nav_label.take() {
                            index.titles.entry(bookpath).or_insert(label);
                        }
                    }
                }
            }
        }
    }

    index
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
