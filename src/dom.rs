//! Document adapter over scraper's DOM and CSS selector engine
//!
//! The transformer never touches scraper types directly; it goes through
//! [`Document`] and [`Node`], which expose just what rule matching and
//! traversal need: tag names, classes, attributes, parent/child links,
//! text content, and a per-document selector query.

pub mod xml;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use ego_tree::NodeId;
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::error::{Error, Result};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A parsed HTML or XML document.
pub struct Document {
    id: DocumentId,
    html: Html,
}

impl Document {
    /// Parse HTML leniently, the way a browser would.
    pub fn parse_html(text: &str) -> Self {
        Self::from_html(Html::parse_document(text))
    }

    /// Parse well-formed XML, keeping element and attribute names as written.
    pub fn parse_xml(text: &str) -> Result<Self> {
        xml::build(text).map(Self::from_html)
    }

    fn from_html(html: Html) -> Self {
        let id = DocumentId::next();
        debug!("Parsed document {:?}", id);
        Self { id, html }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// The outermost element.
    pub fn root(&self) -> Node<'_> {
        Node {
            document: self,
            element: self.html.root_element(),
        }
    }

    /// All elements matching `selector`, as a membership-testable set.
    pub fn query(&self, selector: &str) -> Result<HashSet<NodeId>> {
        let parsed = scraper::Selector::parse(selector)
            .map_err(|e| Error::unknown_selector_syntax(selector, e))?;
        Ok(self.html.select(&parsed).map(|element| element.id()).collect())
    }

    /// Elements matching `selector` in document order.
    pub fn select_all(&self, selector: &str) -> Result<Vec<Node<'_>>> {
        let parsed = scraper::Selector::parse(selector)
            .map_err(|e| Error::unknown_selector_syntax(selector, e))?;
        Ok(self
            .html
            .select(&parsed)
            .map(|element| Node {
                document: self,
                element,
            })
            .collect())
    }

    /// First element matching `selector`, mostly useful in tests.
    pub fn select_first(&self, selector: &str) -> Result<Option<Node<'_>>> {
        let parsed = scraper::Selector::parse(selector)
            .map_err(|e| Error::unknown_selector_syntax(selector, e))?;
        Ok(self.html.select(&parsed).next().map(|element| Node {
            document: self,
            element,
        }))
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("id", &self.id).finish()
    }
}

/// A child of a node, tagged by kind.
#[derive(Debug, Clone, Copy)]
pub enum Child<'d> {
    Element(Node<'d>),
    Text(&'d str),
    Comment(&'d str),
    Other,
}

/// Read-only handle to an element within a [`Document`].
#[derive(Clone, Copy)]
pub struct Node<'d> {
    document: &'d Document,
    element: ElementRef<'d>,
}

impl<'d> Node<'d> {
    pub fn id(&self) -> NodeId {
        self.element.id()
    }

    pub fn document(&self) -> &'d Document {
        self.document
    }

    pub fn tag_name(&self) -> &'d str {
        self.element.value().name()
    }

    pub fn id_attribute(&self) -> Option<&'d str> {
        self.element.value().id()
    }

    pub fn attribute(&self, name: &str) -> Option<&'d str> {
        self.element.value().attr(name)
    }

    pub fn attributes(&self) -> BTreeMap<&'d str, &'d str> {
        self.element.value().attrs().collect()
    }

    pub fn classes(&self) -> Vec<&'d str> {
        self.element.value().classes().collect()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.element.value().classes().any(|class| class == name)
    }

    /// The parent element; `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let document = self.document;
        self.element
            .parent()
            .and_then(ElementRef::wrap)
            .map(|element| Self { document, element })
    }

    /// All child nodes in document order, including text and comments.
    pub fn children(&self) -> impl Iterator<Item = Child<'d>> + 'd {
        let document = self.document;
        self.element.children().map(move |child| match child.value() {
            scraper::Node::Element(_) => ElementRef::wrap(child)
                .map_or(Child::Other, |element| Child::Element(Self { document, element })),
            scraper::Node::Text(text) => Child::Text(&**text),
            scraper::Node::Comment(comment) => Child::Comment(&**comment),
            _ => Child::Other,
        })
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// This node and its ancestors, root first.
    pub fn self_and_parents(&self) -> Vec<Self> {
        let mut chain: Vec<Self> = std::iter::successors(Some(*self), Self::parent).collect();
        chain.reverse();
        chain
    }

    /// Ancestors only, root first.
    pub fn parents(&self) -> Vec<Self> {
        let mut chain = self.self_and_parents();
        chain.pop();
        chain
    }

    /// Debug name in the form `name{#id}{.class}...`; a `div` with an id
    /// or class is written without its tag.
    pub fn simplified_name(&self) -> String {
        let mut name = self.tag_name().to_string();
        if let Some(id) = self.id_attribute() {
            name.push('#');
            name.push_str(id);
        }
        for class in self.classes() {
            name.push('.');
            name.push_str(class);
        }
        match name.strip_prefix("div") {
            Some(rest) if rest.starts_with(['#', '.']) => rest.to_string(),
            _ => name,
        }
    }

    /// Simplified names from the root down to this node.
    pub fn path(&self) -> String {
        self.self_and_parents()
            .iter()
            .map(Self::simplified_name)
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.document.id == other.document.id && self.id() == other.id()
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.simplified_name())
    }
}

impl<'d> From<&'d Document> for Node<'d> {
    fn from(document: &'d Document) -> Self {
        document.root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head>
            <meta http-equiv="content-type" content="text/html; charset=iso-8859-1">
          </head>
          <body class="a b d">
            <div>
              <p>
              </p>
              <p>
                <a id="anchor" foo="bar"></a>
              </p>
            </div>
          </body>
        </html>
    "#;

    fn node<'d>(document: &'d Document, selector: &str) -> Node<'d> {
        document.select_first(selector).unwrap().unwrap()
    }

    #[test]
    fn test_classes() {
        let document = Document::parse_html(PAGE);
        let body = node(&document, "body");
        assert_eq!(body.classes(), vec!["a", "b", "d"]);
        assert!(body.has_class("a"));
        assert!(body.has_class("b"));
        assert!(!body.has_class("c"));
    }

    #[test]
    fn test_attributes() {
        let document = Document::parse_html(PAGE);
        let anchor = node(&document, "a");
        let expected: BTreeMap<&str, &str> = [("id", "anchor"), ("foo", "bar")].into_iter().collect();
        assert_eq!(anchor.attributes(), expected);
        assert!(node(&document, "div").attributes().is_empty());
    }

    #[test]
    fn test_parents() {
        let document = Document::parse_html(PAGE);
        let names = |nodes: Vec<Node<'_>>| nodes.iter().map(Node::tag_name).map(str::to_string).collect::<Vec<_>>();

        assert_eq!(names(node(&document, "a").self_and_parents()), ["html", "body", "div", "p", "a"]);
        assert_eq!(names(node(&document, "a").parents()), ["html", "body", "div", "p"]);
        assert_eq!(names(node(&document, "html").self_and_parents()), ["html"]);
        assert!(node(&document, "html").parents().is_empty());
    }

    #[test]
    fn test_simplified_name() {
        let document = Document::parse_html(r#"<body class="a b d"><div id="x"><a id="anchor"></a></div></body>"#);
        assert_eq!(node(&document, "body").simplified_name(), "body.a.b.d");
        assert_eq!(node(&document, "a").simplified_name(), "a#anchor");
        assert_eq!(node(&document, "div").simplified_name(), "#x");
        assert_eq!(node(&document, "a").path(), "html > body.a.b.d > #x > a#anchor");
    }

    #[test]
    fn test_children_are_tagged_by_kind() {
        let document = Document::parse_html("<ul>one<!-- note --><li>two</li></ul>");
        let list = node(&document, "ul");
        let kinds: Vec<&str> = list
            .children()
            .map(|child| match child {
                Child::Element(_) => "element",
                Child::Text(_) => "text",
                Child::Comment(_) => "comment",
                Child::Other => "other",
            })
            .collect();
        assert_eq!(kinds, ["text", "comment", "element"]);
    }

    #[test]
    fn test_query_reports_bad_selectors() {
        let document = Document::parse_html(PAGE);
        assert_eq!(document.query("p").unwrap().len(), 2);
        assert!(matches!(
            document.query("p[").unwrap_err(),
            Error::UnknownSelectorSyntax { .. }
        ));
    }

    #[test]
    fn test_documents_have_distinct_identity() {
        let first = Document::parse_html(PAGE);
        let second = Document::parse_html(PAGE);
        assert_ne!(first.id(), second.id());
        assert_ne!(first.root(), second.root());
        assert_eq!(first.root(), Node::from(&first));
    }
}
