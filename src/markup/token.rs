//! Token types produced by the [`Tokenizer`](super::Tokenizer).

use std::borrow::Cow;

/// The kind of a tag event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// Opening tag: `<p class="x">`
    Begin,
    /// Closing tag: `</p>`
    End,
    /// Self-closing tag: `<img src="a.png"/>`
    Single,
    /// XML declaration: `<?xml version="1.0"?>`
    XmlHeader,
    /// Document type declaration: `<!DOCTYPE html>`
    Doctype,
    /// Comment: `<!-- ... -->`
    Comment,
    /// CDATA section: `<![CDATA[ ... ]]>`
    CData,
    /// Processing instruction other than the XML declaration.
    Pi,
}

/// Ordered attribute list.
///
/// Values are stored exactly as written in the source, still entity-escaped.
/// Order is preserved so re-serialized tags keep their attribute order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw value of an attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Set an attribute, replacing an existing value in place or appending.
    ///
    /// Returns `true` if the attribute list changed.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) if *existing == value => false,
            Some((_, existing)) => {
                *existing = value;
                true
            }
            None => {
                self.entries.push((name.to_string(), value));
                true
            }
        }
    }

    /// Strip stray whitespace from attribute names.
    ///
    /// Returns `true` if any name changed.
    pub fn trim_names(&mut self) -> bool {
        let mut changed = false;
        for (name, _) in &mut self.entries {
            let trimmed = name.trim();
            if trimmed.len() != name.len() {
                *name = trimmed.to_string();
                changed = true;
            }
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A tag event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name as written (`img`, `navPoint`). Special kinds use a marker
    /// name such as `?xml` or `!--`.
    pub name: String,
    pub kind: TagKind,
    attrs: Attributes,
    /// Dot-joined lowercase names of the elements enclosing this tag.
    pub path: String,
    /// Original source text, dropped as soon as the tag is modified.
    raw: Option<String>,
}

impl Tag {
    /// Create a synthetic tag with no source text.
    pub fn new(name: impl Into<String>, kind: TagKind, attrs: Attributes) -> Self {
        Self {
            name: name.into(),
            kind,
            attrs,
            path: String::new(),
            raw: None,
        }
    }

    pub(crate) fn parsed(
        name: String,
        kind: TagKind,
        attrs: Attributes,
        path: String,
        raw: &str,
    ) -> Self {
        Self {
            name,
            kind,
            attrs,
            path,
            raw: Some(raw.to_string()),
        }
    }

    /// Compare the tag name, ignoring ASCII case.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// `Begin` or `Single`: a tag that opens an element and carries attributes.
    pub fn is_opening(&self) -> bool {
        matches!(self.kind, TagKind::Begin | TagKind::Single)
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains(name)
    }

    /// Set an attribute. The tag only loses its original source text when
    /// the value actually changes.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        if self.attrs.set(name, value) {
            self.raw = None;
        }
    }

    /// Strip stray whitespace around attribute names.
    pub fn trim_attr_names(&mut self) {
        if self.attrs.trim_names() {
            self.raw = None;
        }
    }

    /// Change the tag kind, e.g. to expand `<title/>` into a begin/end pair.
    pub fn set_kind(&mut self, kind: TagKind) {
        if self.kind != kind {
            self.kind = kind;
            self.raw = None;
        }
    }

    /// Whether the tag still serializes to its original source text.
    pub fn is_pristine(&self) -> bool {
        self.raw.is_some()
    }

    /// Serialize the tag.
    pub fn to_markup(&self) -> Cow<'_, str> {
        match &self.raw {
            Some(raw) => Cow::Borrowed(raw),
            None => {
                let mut out = String::new();
                self.render(&mut out);
                Cow::Owned(out)
            }
        }
    }

    pub fn write_markup(&self, out: &mut String) {
        match &self.raw {
            Some(raw) => out.push_str(raw),
            None => self.render(out),
        }
    }

    fn render(&self, out: &mut String) {
        let special = self.attrs.get("special").unwrap_or("");
        match self.kind {
            TagKind::Begin | TagKind::Single => {
                out.push('<');
                out.push_str(&self.name);
                for (name, value) in self.attrs.iter() {
                    // Values containing double quotes can only have come from
                    // a single-quoted source attribute.
                    let quote = if value.contains('"') { '\'' } else { '"' };
                    out.push(' ');
                    out.push_str(name);
                    out.push('=');
                    out.push(quote);
                    out.push_str(value);
                    out.push(quote);
                }
                if self.kind == TagKind::Single {
                    out.push_str("/>");
                } else {
                    out.push('>');
                }
            }
            TagKind::End => {
                out.push_str("</");
                out.push_str(&self.name);
                out.push('>');
            }
            TagKind::XmlHeader | TagKind::Pi => {
                out.push_str("<?");
                out.push_str(special);
                out.push_str("?>");
            }
            TagKind::Doctype => {
                out.push_str("<!");
                out.push_str(special);
                out.push('>');
            }
            TagKind::Comment => {
                out.push_str("<!--");
                out.push_str(special);
                out.push_str("-->");
            }
            TagKind::CData => {
                out.push_str("<![CDATA[");
                out.push_str(special);
                out.push_str("]]>");
            }
        }
    }
}

/// A single event in a markup token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of character data, with the path of its enclosing elements
    /// (innermost last), e.g. `html.head.title`.
    Text { text: String, path: String },
    Tag(Tag),
}

impl Token {
    pub fn write_markup(&self, out: &mut String) {
        match self {
            Token::Text { text, .. } => out.push_str(text),
            Token::Tag(tag) => tag.write_markup(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_render_begin_and_single() {
        let tag = Tag::new("img", TagKind::Single, attrs(&[("src", "a.png"), ("alt", "")]));
        assert_eq!(tag.to_markup(), r#"<img src="a.png" alt=""/>"#);

        let tag = Tag::new("html", TagKind::Begin, attrs(&[("lang", "en")]));
        assert_eq!(tag.to_markup(), r#"<html lang="en">"#);

        let tag = Tag::new("title", TagKind::End, Attributes::new());
        assert_eq!(tag.to_markup(), "</title>");
    }

    #[test]
    fn test_render_quotes_values_with_double_quotes() {
        let tag = Tag::new("a", TagKind::Begin, attrs(&[("title", r#"say "hi""#)]));
        assert_eq!(tag.to_markup(), r#"<a title='say "hi"'>"#);
    }

    #[test]
    fn test_render_special_kinds() {
        let header = Tag::new(
            "?xml",
            TagKind::XmlHeader,
            attrs(&[("special", r#"xml version="1.0""#)]),
        );
        assert_eq!(header.to_markup(), r#"<?xml version="1.0"?>"#);

        let comment = Tag::new("!--", TagKind::Comment, attrs(&[("special", " note ")]));
        assert_eq!(comment.to_markup(), "<!-- note -->");
    }

    #[test]
    fn test_set_attr_same_value_keeps_raw() {
        let mut tag = Tag::parsed(
            "img".into(),
            TagKind::Single,
            attrs(&[("alt", "x")]),
            String::new(),
            "<img  alt = 'x' />",
        );
        tag.set_attr("alt", "x");
        assert!(tag.is_pristine());
        assert_eq!(tag.to_markup(), "<img  alt = 'x' />");

        tag.set_attr("alt", "y");
        assert!(!tag.is_pristine());
        assert_eq!(tag.to_markup(), r#"<img alt="y"/>"#);
    }

    #[test]
    fn test_attributes_set_appends_in_order() {
        let mut a = attrs(&[("id", "c1")]);
        assert!(a.set("lang", "en"));
        assert!(a.set("xml:lang", "en"));
        assert!(!a.set("lang", "en"));
        let names: Vec<_> = a.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "lang", "xml:lang"]);
    }

    #[test]
    fn test_trim_names() {
        let mut a = attrs(&[(" epub:type", "chapter"), ("id\n", "c1")]);
        assert!(a.trim_names());
        assert_eq!(a.get("epub:type"), Some("chapter"));
        assert_eq!(a.get("id"), Some("c1"));
        assert!(!a.trim_names());
    }
}
