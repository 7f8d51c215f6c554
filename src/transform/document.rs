//! The per-document accessibility rewrite.

use super::is_image_tag;
use crate::aria::resolve_role;
use crate::bookpath::resolve_href;
use crate::markup::{Attributes, Tag, TagKind, Token, Tokenizer, merge_values, split_values};
use crate::nav::{Landmark, Locator, NavIndex};

/// Book-level settings for one content document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    /// Manifest id of the document.
    pub manifest_id: &'a str,
    /// Bookpath of the document; relative links resolve against its directory.
    pub bookpath: &'a str,
    /// Primary language of the publication (first `dc:language`).
    pub language: &'a str,
    /// Apply EPUB3-only rules (landmark `epub:type`s).
    pub is_epub3: bool,
    /// Derive ARIA roles from `epub:type`. Only meaningful for EPUB3 and
    /// switched off for books whose media rule out the accessibility claims.
    pub derive_roles: bool,
}

/// One `<img>` occurrence in a content document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub manifest_id: String,
    pub document_bookpath: String,
    /// 1-based position among the document's images, in document order.
    pub index: usize,
    /// `src` attribute as written.
    pub src: String,
    pub image_bookpath: String,
    /// Existing `alt` attribute, raw (still entity-escaped); empty if absent.
    pub alt_text: String,
}

/// Result of [`transform_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub xhtml: String,
    pub images: Vec<ImageRecord>,
}

/// Rewrite one content document.
///
/// In a single pass over the token stream this:
/// - sets `lang`/`xml:lang` on `<html>` to the primary language
/// - fills an empty `<head><title>` from the navigation titles
/// - appends the document's landmark `epub:type` to the element it targets
/// - makes sure every `<img>` has an `alt` attribute and records it
/// - adds ARIA roles derived from `epub:type` values
///
/// Everything else is re-emitted byte-for-byte.
pub fn transform_document(source: &str, ctx: &DocumentContext<'_>, nav: &NavIndex) -> Transformed {
    let mut out = String::with_capacity(source.len() + source.len() / 16);
    let mut images = Vec::new();
    let landmark = if ctx.is_epub3 {
        nav.landmark(ctx.bookpath)
    } else {
        None
    };
    let title = nav.title(ctx.bookpath).unwrap_or("");
    let mut has_title_text = false;
    let mut image_count = 0;

    for token in Tokenizer::new(source) {
        let mut tag = match token {
            Token::Text { text, path } => {
                if in_head_title(&path) && !text.trim().is_empty() {
                    has_title_text = true;
                }
                out.push_str(&text);
                continue;
            }
            Token::Tag(tag) => tag,
        };

        tag.trim_attr_names();

        if let Some(landmark) = landmark {
            apply_landmark(&mut tag, landmark);
        }

        if tag.is("html") && tag.kind == TagKind::Begin {
            tag.set_attr("lang", ctx.language);
            tag.set_attr("xml:lang", ctx.language);
        }

        if is_image_tag(&tag) {
            image_count += 1;
            images.push(record_image(&mut tag, ctx, image_count));
        }

        if ctx.derive_roles {
            apply_roles(&mut tag);
        }

        if tag.is("title") && has_segment(&tag.path, "head") {
            match tag.kind {
                TagKind::End if !has_title_text => out.push_str(title),
                TagKind::Single => {
                    // `<title/>` has no end event: expand it to a full element.
                    tag.set_kind(TagKind::Begin);
                    tag.write_markup(&mut out);
                    out.push_str(title);
                    tag = Tag::new(tag.name, TagKind::End, Attributes::new());
                }
                _ => {}
            }
        }

        tag.write_markup(&mut out);
    }

    Transformed { xhtml: out, images }
}

/// Append the landmark's `epub:type` to the element it points at.
fn apply_landmark(tag: &mut Tag, landmark: &Landmark) {
    if !tag.is_opening() {
        return;
    }
    let matches = match landmark.locator {
        Locator::ById => tag.attr("id") == Some(landmark.fragment.as_str()),
    };
    if !matches {
        return;
    }
    let existing = split_values(tag.attr("epub:type"));
    if existing.contains(&landmark.epub_type) {
        return;
    }
    if let Some(value) = merge_values(existing, [landmark.epub_type.as_str()]) {
        tag.set_attr("epub:type", value);
    }
}

fn record_image(tag: &mut Tag, ctx: &DocumentContext<'_>, index: usize) -> ImageRecord {
    let alt_text = tag.attr("alt").unwrap_or("").to_string();
    // Guarantee the attribute is present, even if empty.
    tag.set_attr("alt", alt_text.as_str());
    let src = tag.attr("src").unwrap_or("").to_string();
    let (image_bookpath, _) = resolve_href(&src, ctx.bookpath);
    ImageRecord {
        manifest_id: ctx.manifest_id.to_string(),
        document_bookpath: ctx.bookpath.to_string(),
        index,
        src,
        image_bookpath,
        alt_text,
    }
}

/// Merge roles derived from the tag's `epub:type` values into its `role`.
///
/// Every derived role is appended; roles already present are kept as is.
fn apply_roles(tag: &mut Tag) {
    if !tag.is_opening() {
        return;
    }
    let Some(epub_types) = tag.attr("epub:type") else {
        return;
    };
    let tag_name = tag.name.to_ascii_lowercase();
    let has_href = tag.has_attr("href");
    let has_alt = tag.has_attr("alt");
    let derived: Vec<&'static str> = split_values(Some(epub_types))
        .iter()
        .filter_map(|t| resolve_role(t, &tag_name, has_href, has_alt))
        .collect();
    if derived.is_empty() {
        return;
    }
    let existing = split_values(tag.attr("role"));
    if let Some(roles) = merge_values(existing, derived) {
        tag.set_attr("role", roles);
    }
}

fn has_segment(path: &str, name: &str) -> bool {
    path.split('.').any(|s| s == name)
}

fn in_head_title(path: &str) -> bool {
    path.rsplit('.').next() == Some("title") && has_segment(path, "head")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::TitleMap;

    fn ctx(bookpath: &str) -> DocumentContext<'_> {
        DocumentContext {
            manifest_id: "ch1",
            bookpath,
            language: "en-US",
            is_epub3: true,
            derive_roles: true,
        }
    }

    fn nav_with_title(bookpath: &str, title: &str) -> NavIndex {
        NavIndex {
            titles: TitleMap::from([(bookpath.to_string(), title.to_string())]),
            ..Default::default()
        }
    }

    #[test]
    fn test_untouched_markup_is_byte_identical() {
        let src = "<div  class='x'>\n<p>Hello <b>world</b> &amp; more</p><!-- c -->\n</div>";
        let out = transform_document(src, &ctx("OEBPS/Text/a.xhtml"), &NavIndex::default());
        assert_eq!(out.xhtml, src);
        assert!(out.images.is_empty());
    }

    #[test]
    fn test_html_language_overwritten() {
        let src = r#"<html xmlns="http://www.w3.org/1999/xhtml" lang="fr" xml:lang="fr"><body/></html>"#;
        let out = transform_document(src, &ctx("a.xhtml"), &NavIndex::default());
        assert_eq!(
            out.xhtml,
            r#"<html xmlns="http://www.w3.org/1999/xhtml" lang="en-US" xml:lang="en-US"><body/></html>"#
        );
    }

    #[test]
    fn test_title_injected_when_empty() {
        let src = "<html><head><title></title></head><body></body></html>";
        let nav = nav_with_title("OEBPS/Text/c1.xhtml", "Chapter 1");
        let out = transform_document(src, &ctx("OEBPS/Text/c1.xhtml"), &nav);
        assert!(out.xhtml.contains("<head><title>Chapter 1</title></head>"));
    }

    #[test]
    fn test_existing_title_untouched() {
        let src = "<html><head><title>Mine</title></head><body></body></html>";
        let nav = nav_with_title("c1.xhtml", "Chapter 1");
        let out = transform_document(src, &ctx("c1.xhtml"), &nav);
        assert!(out.xhtml.contains("<head><title>Mine</title></head>"));
    }

    #[test]
    fn test_self_closing_title_expanded() {
        let src = "<html><head><title/></head><body></body></html>";
        let nav = nav_with_title("c1.xhtml", "Chapter 1");
        let out = transform_document(src, &ctx("c1.xhtml"), &nav);
        assert!(out.xhtml.contains("<head><title>Chapter 1</title></head>"));
    }

    #[test]
    fn test_title_outside_head_ignored() {
        let src = "<html><head></head><body><svg><title></title></svg></body></html>";
        let nav = nav_with_title("c1.xhtml", "Chapter 1");
        let out = transform_document(src, &ctx("c1.xhtml"), &nav);
        assert!(!out.xhtml.contains("Chapter 1"));
    }

    #[test]
    fn test_image_inventory() {
        let src = r#"<body><img src="../Images/a%20b.png"/><p><img alt="A &amp; B" src="../Images/b.jpg"></img></p><img src="../Images/a%20b.png" alt=""/></body>"#;
        let out = transform_document(src, &ctx("OEBPS/Text/c1.xhtml"), &NavIndex::default());
        let got: Vec<_> = out
            .images
            .iter()
            .map(|r| (r.index, r.image_bookpath.as_str(), r.alt_text.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                (1, "OEBPS/Images/a b.png", ""),
                (2, "OEBPS/Images/b.jpg", "A &amp; B"),
                (3, "OEBPS/Images/a b.png", ""),
            ]
        );
        assert_eq!(out.images[0].src, "../Images/a%20b.png");
        assert_eq!(out.images[0].manifest_id, "ch1");
        // Missing alt added; existing ones untouched.
        assert!(out.xhtml.starts_with(r#"<body><img src="../Images/a%20b.png" alt=""/>"#));
        assert!(out.xhtml.contains(r#"<img alt="A &amp; B" src="../Images/b.jpg">"#));
        assert!(out.xhtml.ends_with(r#"<img src="../Images/a%20b.png" alt=""/></body>"#));
    }

    #[test]
    fn test_landmark_epub_type_appended() {
        let mut nav = NavIndex::default();
        nav.landmarks.insert(
            "c1.xhtml".into(),
            Landmark {
                locator: Locator::ById,
                fragment: "start".into(),
                epub_type: "bodymatter".into(),
            },
        );
        let src = r#"<section id="start" epub:type="chapter"><p id="x"/></section>"#;
        let out = transform_document(src, &ctx("c1.xhtml"), &nav);
        assert!(
            out.xhtml
                .starts_with(r#"<section id="start" epub:type="chapter bodymatter" role="doc-chapter">"#)
        );

        // Not duplicated when already present.
        let src = r#"<div id="start" epub:type="bodymatter">"#;
        let out = transform_document(src, &ctx("c1.xhtml"), &nav);
        assert_eq!(out.xhtml, src);
    }

    #[test]
    fn test_landmark_ignored_for_epub2() {
        let mut nav = NavIndex::default();
        nav.landmarks.insert(
            "c1.xhtml".into(),
            Landmark {
                locator: Locator::ById,
                fragment: "start".into(),
                epub_type: "bodymatter".into(),
            },
        );
        let context = DocumentContext {
            is_epub3: false,
            derive_roles: false,
            ..ctx("c1.xhtml")
        };
        let src = r#"<div id="start">"#;
        assert_eq!(transform_document(src, &context, &nav).xhtml, src);
    }

    #[test]
    fn test_roles_merged_never_removed() {
        let src = r#"<aside epub:type="footnote tip" role="note"></aside>"#;
        let out = transform_document(src, &ctx("c1.xhtml"), &NavIndex::default());
        assert_eq!(
            out.xhtml,
            r#"<aside epub:type="footnote tip" role="note doc-footnote doc-tip"></aside>"#
        );
    }

    #[test]
    fn test_roles_respect_href_rule() {
        let src = r#"<a href="n.xhtml#n1" epub:type="noteref chapter">1</a>"#;
        let out = transform_document(src, &ctx("c1.xhtml"), &NavIndex::default());
        assert_eq!(
            out.xhtml,
            r#"<a href="n.xhtml#n1" epub:type="noteref chapter" role="doc-noteref">1</a>"#
        );
    }

    #[test]
    fn test_roles_disabled() {
        let context = DocumentContext {
            derive_roles: false,
            ..ctx("c1.xhtml")
        };
        let src = r#"<td epub:type="table-cell">x</td>"#;
        assert_eq!(transform_document(src, &context, &NavIndex::default()).xhtml, src);
    }

    #[test]
    fn test_stray_whitespace_in_attribute_names() {
        let mut tag = Tag::new(
            "td",
            TagKind::Begin,
            [(" epub:type ", "table-cell")].into_iter().collect(),
        );
        tag.trim_attr_names();
        apply_roles(&mut tag);
        assert_eq!(tag.attr("role"), Some("cell"));
    }
}
