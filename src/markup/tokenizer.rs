//! Lenient streaming tokenizer for XHTML and XML documents.
//!
//! Not a validating parser. It splits source text into text runs and tag
//! events, tracks the stack of open elements to report ancestor paths, and
//! keeps the source slice of every tag so unmodified events serialize back
//! to the exact input bytes. Malformed markup is passed through as text.

use memchr::{memchr, memchr3, memmem};

use super::token::{Attributes, Tag, TagKind, Token};

/// Iterator over the [`Token`]s of a markup document.
///
/// # Examples
///
/// ```
/// use access_aide::markup::{Token, Tokenizer};
///
/// let tokens: Vec<Token> = Tokenizer::new("<head><title>Hi</title></head>").collect();
/// match &tokens[2] {
///     Token::Text { text, path } => {
///         assert_eq!(text, "Hi");
///         assert_eq!(path, "head.title");
///     }
///     _ => unreachable!(),
/// }
/// ```
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    /// Lowercased names of currently open elements.
    stack: Vec<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            stack: Vec::new(),
        }
    }

    fn path(&self) -> String {
        self.stack.join(".")
    }

    /// Emit text from the current position up to the next `<` at or after
    /// `search_from`.
    fn text_until_next_tag(&mut self, search_from: usize) -> Token {
        let bytes = self.src.as_bytes();
        let end = memchr(b'<', &bytes[search_from..])
            .map(|i| search_from + i)
            .unwrap_or(bytes.len());
        let text = &self.src[self.pos..end];
        self.pos = end;
        Token::Text {
            text: text.to_string(),
            path: self.path(),
        }
    }

    /// Emit the remainder of the input as text (unterminated construct).
    fn rest_as_text(&mut self) -> Token {
        let text = &self.src[self.pos..];
        self.pos = self.src.len();
        Token::Text {
            text: text.to_string(),
            path: self.path(),
        }
    }

    /// Tokenize a construct delimited by `open`..`close`, e.g. comments.
    fn delimited(&mut self, open: &str, close: &str, name: &str, kind: TagKind) -> Token {
        let start = self.pos;
        let body_start = start + open.len();
        let Some(off) = memmem::find(&self.src.as_bytes()[body_start..], close.as_bytes()) else {
            return self.rest_as_text();
        };
        let body_end = body_start + off;
        let end = body_end + close.len();
        let mut attrs = Attributes::new();
        attrs.push("special".into(), self.src[body_start..body_end].to_string());
        self.pos = end;
        Token::Tag(Tag::parsed(
            name.to_string(),
            kind,
            attrs,
            self.path(),
            &self.src[start..end],
        ))
    }

    fn processing_instruction(&mut self) -> Token {
        let start = self.pos;
        let rest = &self.src[start + 2..];
        let is_header = rest.starts_with("xml")
            && rest[3..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_whitespace() || c == '?');
        if is_header {
            self.delimited("<?", "?>", "?xml", TagKind::XmlHeader)
        } else {
            let target: String = rest
                .chars()
                .take_while(|c| !c.is_whitespace() && *c != '?')
                .collect();
            self.delimited("<?", "?>", &format!("?{target}"), TagKind::Pi)
        }
    }

    /// Tokenize an element tag starting at `self.pos`.
    fn element(&mut self) -> Token {
        let start = self.pos;
        let Some(end) = find_tag_end(self.src.as_bytes(), start + 1) else {
            return self.rest_as_text();
        };
        let raw = &self.src[start..end];
        // Strip `<` and `>`.
        let inner = &raw[1..raw.len() - 1];

        if let Some(body) = inner.strip_prefix('/') {
            let name = body.trim().to_string();
            let lowered = name.to_ascii_lowercase();
            // Pop up to the matching element; leave the stack alone when the
            // end tag has no open counterpart.
            if let Some(idx) = self.stack.iter().rposition(|n| *n == lowered) {
                self.stack.truncate(idx);
            }
            self.pos = end;
            return Token::Tag(Tag::parsed(
                name,
                TagKind::End,
                Attributes::new(),
                self.path(),
                raw,
            ));
        }

        let (body, kind) = match inner.strip_suffix('/') {
            Some(body) => (body, TagKind::Single),
            None => (inner, TagKind::Begin),
        };
        let name_len = body
            .find(|c: char| c.is_whitespace())
            .unwrap_or(body.len());
        let name = body[..name_len].to_string();
        let attrs = parse_attributes(&body[name_len..]);
        let path = self.path();
        if kind == TagKind::Begin {
            self.stack.push(name.to_ascii_lowercase());
        }
        self.pos = end;
        Token::Tag(Tag::parsed(name, kind, attrs, path, raw))
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.pos >= self.src.len() {
            return None;
        }
        let rest = &self.src[self.pos..];
        if !rest.starts_with('<') {
            return Some(self.text_until_next_tag(self.pos));
        }

        let token = if rest.starts_with("<!--") {
            self.delimited("<!--", "-->", "!--", TagKind::Comment)
        } else if rest.starts_with("<![CDATA[") {
            self.delimited("<![CDATA[", "]]>", "![CDATA[", TagKind::CData)
        } else if rest.starts_with("<!") {
            self.delimited("<!", ">", "!DOCTYPE", TagKind::Doctype)
        } else if rest.starts_with("<?") {
            self.processing_instruction()
        } else if rest[1..]
            .chars()
            .next()
            .is_some_and(|c| c == '/' || c.is_alphabetic() || c == '_' || c == ':')
        {
            self.element()
        } else {
            // A stray `<`: keep it as text.
            self.text_until_next_tag(self.pos + 1)
        };
        Some(token)
    }
}

/// Find the byte offset just past the `>` closing the tag whose name starts
/// at `from`, skipping `>` inside quoted attribute values.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(off) = memchr3(b'>', b'"', b'\'', &bytes[pos..]) {
        let at = pos + off;
        match bytes[at] {
            b'>' => return Some(at + 1),
            quote => {
                // Only a quote directly after `=` opens a value.
                let opens_value = bytes[from..at]
                    .iter()
                    .rev()
                    .find(|b| !b.is_ascii_whitespace())
                    == Some(&b'=');
                if opens_value {
                    let close = memchr(quote, &bytes[at + 1..])?;
                    pos = at + 1 + close + 1;
                } else {
                    pos = at + 1;
                }
            }
        }
    }
    None
}

/// Parse the attribute section of a tag. Values are kept raw.
fn parse_attributes(body: &str) -> Attributes {
    let bytes = body.as_bytes();
    let len = bytes.len();
    let mut attrs = Attributes::new();
    let mut pos = 0;

    while pos < len {
        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= len {
            break;
        }

        let name_start = pos;
        while pos < len && bytes[pos] != b'=' && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name = &body[name_start..pos];

        let mut look = pos;
        while look < len && bytes[look].is_ascii_whitespace() {
            look += 1;
        }
        if look >= len || bytes[look] != b'=' {
            // Attribute without a value.
            if !name.is_empty() {
                attrs.push(name.to_string(), String::new());
            }
            continue;
        }
        pos = look + 1;
        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let value = if pos < len && (bytes[pos] == b'"' || bytes[pos] == b'\'') {
            let quote = bytes[pos];
            let value_start = pos + 1;
            let value_end = memchr(quote, &bytes[value_start..])
                .map(|i| value_start + i)
                .unwrap_or(len);
            pos = (value_end + 1).min(len);
            &body[value_start..value_end]
        } else {
            let value_start = pos;
            while pos < len && !bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            &body[value_start..pos]
        };
        if !name.is_empty() {
            attrs.push(name.to_string(), value.to_string());
        }
    }

    attrs
}
