//! Maps `epub:type` semantics to ARIA roles.
//!
//! EPUB 3.2 and the ARIA-in-HTML rules make this a two-tier lookup:
//!
//! 1. most phrasing/flow tags accept any role, subject to two conditions
//!    (whether the tag may carry an `href`, whether it needs an `alt`);
//! 2. each role is additionally allowed on a specific list of tags.
//!
//! The tables are immutable and built once on first use.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// `epub:type` value -> ARIA role. Types with no ARIA equivalent are absent.
static EPUB_TYPE_ROLES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("abstract", "doc-abstract"),
        ("acknowledgments", "doc-acknowledgments"),
        ("afterword", "doc-afterword"),
        ("appendix", "doc-appendix"),
        ("biblioentry", "doc-biblioentry"),
        ("bibliography", "doc-bibliography"),
        ("biblioref", "doc-biblioref"),
        ("chapter", "doc-chapter"),
        ("colophon", "doc-colophon"),
        ("conclusion", "doc-conclusion"),
        ("cover-image", "doc-cover"),
        ("credit", "doc-credit"),
        ("credits", "doc-credits"),
        ("dedication", "doc-dedication"),
        ("endnote", "doc-endnote"),
        ("endnotes", "doc-endnotes"),
        ("epigraph", "doc-epigraph"),
        ("epilogue", "doc-epilogue"),
        ("errata", "doc-errata"),
        ("figure", "figure"),
        ("footnote", "doc-footnote"),
        ("foreword", "doc-foreword"),
        ("glossary", "doc-glossary"),
        ("glossdef", "definition"),
        ("glossref", "doc-glossref"),
        ("glossterm", "term"),
        ("index", "doc-index"),
        ("introduction", "doc-introduction"),
        ("landmarks", "directory"),
        ("list", "list"),
        ("list-item", "listitem"),
        ("noteref", "doc-noteref"),
        ("notice", "doc-notice"),
        ("page-list", "doc-pagelist"),
        ("pagebreak", "doc-pagebreak"),
        ("part", "doc-part"),
        ("preface", "doc-preface"),
        ("prologue", "doc-prologue"),
        ("pullquote", "doc-pullquote"),
        ("qna", "doc-qna"),
        ("referrer", "doc-backlink"),
        ("subtitle", "doc-subtitle"),
        ("table", "table"),
        ("table-row", "row"),
        ("table-cell", "cell"),
        ("tip", "doc-tip"),
        ("toc", "doc-toc"),
    ])
});

/// ARIA role -> tags it is explicitly allowed on, beyond the general rule.
static ROLE_EXTRA_TAGS: LazyLock<HashMap<&'static str, HashSet<&'static str>>> =
    LazyLock::new(|| {
        let table: &[(&str, &[&str])] = &[
            ("doc-abstract", &["section"]),
            ("doc-acknowledgments", &["section"]),
            ("doc-afterword", &["section"]),
            ("doc-appendix", &["section"]),
            ("doc-biblioentry", &["li"]),
            ("doc-bibliography", &["section"]),
            ("doc-biblioref", &["a"]),
            ("doc-chapter", &["section"]),
            ("doc-colophon", &["section"]),
            ("doc-conclusion", &["section"]),
            ("doc-cover", &["img"]),
            ("doc-credit", &["section"]),
            ("doc-credits", &["section"]),
            ("doc-dedication", &["section"]),
            ("doc-endnote", &["li"]),
            ("doc-endnotes", &["section"]),
            ("doc-epigraph", &[]),
            ("doc-epilogue", &["section"]),
            ("doc-errata", &["section"]),
            ("figure", &[]),
            ("doc-footnote", &["aside", "footer", "header"]),
            ("doc-foreword", &["section"]),
            ("doc-glossary", &["section"]),
            ("definition", &[]),
            ("doc-glossref", &["a"]),
            ("term", &[]),
            ("doc-index", &["nav", "section"]),
            ("doc-introduction", &["section"]),
            ("directory", &["ol", "ul"]),
            ("list", &[]),
            ("listitem", &[]),
            ("doc-noteref", &["a"]),
            ("doc-notice", &["section"]),
            ("doc-pagelist", &["nav", "section"]),
            ("doc-pagebreak", &["hr"]),
            ("doc-part", &["section"]),
            ("doc-preface", &["section"]),
            ("doc-prologue", &["section"]),
            ("doc-pullquote", &["aside", "section"]),
            ("doc-qna", &["section"]),
            ("doc-backlink", &["a"]),
            ("doc-subtitle", &["h1", "h2", "h3", "h4", "h5", "h6"]),
            ("table", &[]),
            ("cell", &[]),
            ("row", &[]),
            ("doc-tip", &["aside"]),
            ("doc-toc", &["nav", "section"]),
        ];
        table
            .iter()
            .map(|(role, tags)| (*role, tags.iter().copied().collect()))
            .collect()
    });

/// Conditions on a tag that accepts any role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AnyRoleRule {
    /// The role may be applied even when the tag carries an `href`.
    href_allowed: bool,
    /// The tag must carry an `alt` attribute.
    alt_required: bool,
}

const fn rule(href_allowed: bool, alt_required: bool) -> AnyRoleRule {
    AnyRoleRule {
        href_allowed,
        alt_required,
    }
}

/// Tags that allow all roles, subject to their conditions.
static ANY_ROLE_TAGS: LazyLock<HashMap<&'static str, AnyRoleRule>> = LazyLock::new(|| {
    let mut map = HashMap::from([("a", rule(false, false)), ("img", rule(false, true))]);
    for tag in [
        "abbr", "address", "b", "bdi", "bdo", "blockquote", "br", "canvas", "cite", "code", "del",
        "dfn", "div", "em", "i", "ins", "kbd", "mark", "output", "p", "pre", "q", "rp", "rt",
        "ruby", "s", "samp", "small", "span", "strong", "sub", "sup", "table", "tbody", "td",
        "tfoot", "thead", "th", "tr", "time", "u", "var", "wbr",
    ] {
        map.insert(tag, rule(true, false));
    }
    map
});

/// The ARIA role corresponding to an `epub:type` value, if any, regardless
/// of the host tag.
pub fn role_for_epub_type(epub_type: &str) -> Option<&'static str> {
    EPUB_TYPE_ROLES.get(epub_type).copied()
}

/// Resolve the ARIA role for one `epub:type` value on a given tag.
///
/// `has_href` and `has_alt` report whether the tag carries those attributes.
/// Returns `None` when the type has no ARIA equivalent or the role is not
/// allowed on this tag.
///
/// # Examples
///
/// ```
/// use access_aide::aria::resolve_role;
///
/// assert_eq!(resolve_role("table-cell", "td", false, false), Some("cell"));
/// assert_eq!(resolve_role("chapter", "section", false, false), Some("doc-chapter"));
/// assert_eq!(resolve_role("biblioref", "span", false, false), Some("doc-biblioref"));
/// assert_eq!(resolve_role("biblioref", "li", false, false), None);
/// ```
pub fn resolve_role(
    epub_type: &str,
    tag_name: &str,
    has_href: bool,
    has_alt: bool,
) -> Option<&'static str> {
    let role = role_for_epub_type(epub_type)?;

    if let Some(rule) = ANY_ROLE_TAGS.get(tag_name) {
        let allowed = !(has_href && !rule.href_allowed) && !(rule.alt_required && !has_alt);
        if allowed {
            return Some(role);
        }
    }

    ROLE_EXTRA_TAGS
        .get(role)
        .filter(|tags| tags.contains(tag_name))
        .map(|_| role)
}
