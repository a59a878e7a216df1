//! Input events consumed by the labeling engine.
//!
//! The engine never parses HTML itself. A tokenizer (see
//! [`LabelRewriter`](crate::LabelRewriter) for the bundled `lol_html` one)
//! turns markup into a depth-first stream of [`Event`]s, which carry enough of
//! the original text for the engine to serialize it back out.

use regex::Regex;
use std::sync::LazyLock;

/// A character reference at the start of the haystack.
static CHAR_REF_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});")
        .expect("character reference pattern is valid")
});

/// Elements that never have content or an end tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param", "source", "track",
    "wbr",
];

/// Returns true if `tag` is an HTML void element.
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Quoting style of an attribute value, kept so output mirrors input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
    Unquoted,
}

/// A single attribute on a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name as written.
    pub name: String,
    /// Attribute value; `None` for a bare attribute such as `<header id>`.
    pub value: Option<String>,
    /// How the value was quoted.
    pub quote: Quote,
}

impl Attribute {
    /// Creates a double-quoted attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: Some(value.into()), quote: Quote::Double }
    }

    /// Creates an attribute without a value.
    pub fn bare(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: None, quote: Quote::Double }
    }

    /// Sets the quoting style.
    pub fn with_quote(mut self, quote: Quote) -> Self {
        self.quote = quote;
        self
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Serializes the attribute (with a leading space) into `out`.
    ///
    /// A bare `&` and the delimiting quote are escaped; character references
    /// already present are kept. An unquoted value that would not survive
    /// unquoted is double-quoted.
    pub fn write_to(&self, out: &mut String) {
        out.push(' ');
        out.push_str(&self.name);
        let Some(value) = &self.value else {
            return;
        };
        out.push('=');
        let needs_quotes = value.is_empty()
            || value.contains(|c: char| c.is_ascii_whitespace() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '`' | '&'));
        match self.quote {
            Quote::Single => {
                out.push('\'');
                escape_value(value, '\'', "&#39;", out);
                out.push('\'');
            }
            Quote::Unquoted if !needs_quotes => out.push_str(value),
            _ => {
                out.push('"');
                escape_value(value, '"', "&quot;", out);
                out.push('"');
            }
        }
    }
}

fn escape_value(value: &str, quote: char, escaped_quote: &str, out: &mut String) {
    for (i, c) in value.char_indices() {
        match c {
            '&' if !CHAR_REF_START.is_match(&value[i..]) => out.push_str("&amp;"),
            c if c == quote => out.push_str(escaped_quote),
            c => out.push(c),
        }
    }
}

/// An element start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Tag name as written in the source.
    pub name: String,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Whether the tag was written as `<name/>`.
    pub self_closing: bool,
    /// Whether the element closes immediately (no content, no end tag).
    pub void: bool,
}

impl StartTag {
    /// Creates a start tag; void-ness is derived from the tag name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let void = is_void_tag(&name);
        Self { name, attributes: Vec::new(), self_closing: false, void }
    }

    /// Adds a double-quoted attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Adds an arbitrary attribute.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Marks the tag as written in self-closing syntax.
    pub fn self_closing(mut self, void: bool) -> Self {
        self.self_closing = true;
        self.void = void;
        self
    }

    /// Looks up an attribute value by (case-insensitive) name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.is(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }
}

/// One step of the depth-first document stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An element opens.
    OpenTag(StartTag),
    /// Character data, raw as it appeared in the source.
    Text(String),
    /// A comment, without the `<!--`/`-->` delimiters.
    Comment(String),
    /// A doctype, rendered back to markup.
    Doctype(String),
    /// Markup the tokenizer reported as is, such as an end tag with no open
    /// element; passed through untouched.
    Raw(String),
    /// An element closes; carries the end tag name as written.
    CloseTag(String),
}
