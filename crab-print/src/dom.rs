//! Minimal document model
//!
//! Style nodes mirror what a host document keeps in its head (stylesheet
//! links and inline style blocks). [`DocumentTree`] is what a render
//! function hands back and what providers wrap.

use std::fmt::Write as _;

/// A stylesheet node, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleNode {
    /// `<link rel="stylesheet">`
    Link { href: String, media: Option<String> },
    /// `<style>` block
    Inline { id: Option<String>, css: String },
}

impl StyleNode {
    pub fn link(href: impl Into<String>) -> Self {
        StyleNode::Link {
            href: href.into(),
            media: None,
        }
    }

    pub fn inline(css: impl Into<String>) -> Self {
        StyleNode::Inline {
            id: None,
            css: css.into(),
        }
    }

    /// Set the media query (links only)
    pub fn with_media(self, media: impl Into<String>) -> Self {
        match self {
            StyleNode::Link { href, .. } => StyleNode::Link {
                href,
                media: Some(media.into()),
            },
            other => other,
        }
    }

    /// Set the element id (inline blocks only)
    pub fn with_id(self, id: impl Into<String>) -> Self {
        match self {
            StyleNode::Inline { css, .. } => StyleNode::Inline {
                id: Some(id.into()),
                css,
            },
            other => other,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            StyleNode::Inline { id, .. } => id.as_deref(),
            StyleNode::Link { .. } => None,
        }
    }

    pub fn css(&self) -> Option<&str> {
        match self {
            StyleNode::Inline { css, .. } => Some(css),
            StyleNode::Link { .. } => None,
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            StyleNode::Link { href, media } => {
                let mut out = format!(r#"<link rel="stylesheet" href="{}""#, escape(href));
                if let Some(media) = media {
                    let _ = write!(out, r#" media="{}""#, escape(media));
                }
                out.push('>');
                out
            }
            StyleNode::Inline { id, css } => match id {
                Some(id) => format!(r#"<style id="{}">{}</style>"#, escape(id), css),
                None => format!("<style>{}</style>", css),
            },
        }
    }
}

/// An element with attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<DocumentTree>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, child: impl Into<DocumentTree>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(DocumentTree::Text(text.into()))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Tree returned by a render function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentTree {
    Element(Element),
    Text(String),
}

impl DocumentTree {
    pub fn text(text: impl Into<String>) -> Self {
        DocumentTree::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            DocumentTree::Element(el) => Some(el),
            DocumentTree::Text(_) => None,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            DocumentTree::Text(text) => out.push_str(&escape(text)),
            DocumentTree::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    let _ = write!(out, r#" {}="{}""#, name, escape(value));
                }
                out.push('>');
                for child in &el.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }
}

impl From<Element> for DocumentTree {
    fn from(el: Element) -> Self {
        DocumentTree::Element(el)
    }
}

fn escape(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(ch),
        }
    }
    output
}
