//! XML loading into scraper's tree
//!
//! scraper only parses HTML, and the HTML tree builder rewrites feeds
//! badly (`<link>` is a void element, tag names are lowercased). This
//! module reads the XML event stream with quick-xml and grows the same
//! tree type directly, so selector queries work unchanged.

use ego_tree::NodeId;
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use scraper::node::{Comment, Element, Text};
use scraper::{Html, Node};
use tracing::debug;

use crate::error::{Error, Result};

pub(super) fn build(text: &str) -> Result<Html> {
    let mut reader = Reader::from_str(text);
    let mut html = Html::new_document();
    let mut open: Vec<NodeId> = vec![html.tree.root().id()];

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let id = append(&mut html, &open, Node::Element(element(&start)?));
                open.push(id);
            }
            Event::Empty(start) => {
                append(&mut html, &open, Node::Element(element(&start)?));
            }
            Event::End(_) => {
                open.pop();
            }
            // Whitespace around the root element is not content.
            Event::Text(_) | Event::CData(_) if open.len() == 1 => {}
            Event::Text(content) => {
                let text = content.unescape()?;
                append(&mut html, &open, text_node(&text));
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data);
                append(&mut html, &open, text_node(&text));
            }
            Event::Comment(content) => {
                let comment = String::from_utf8_lossy(&content);
                append(
                    &mut html,
                    &open,
                    Node::Comment(Comment {
                        comment: StrTendril::from(comment.as_ref()),
                    }),
                );
            }
            Event::Eof => break,
            // Declarations, processing instructions, doctypes.
            _ => {}
        }
    }

    if open.len() > 1 {
        let unclosed = open
            .last()
            .and_then(|&id| html.tree.get(id))
            .and_then(|node| node.value().as_element())
            .map(|element| element.name().to_string())
            .unwrap_or_default();
        debug!("XML input ended with {} unclosed element(s)", open.len() - 1);
        return Err(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(unclosed)).into());
    }
    if !html.tree.root().children().any(|child| child.value().is_element()) {
        return Err(Error::EmptyDocument);
    }
    Ok(html)
}

fn append(html: &mut Html, open: &[NodeId], node: Node) -> NodeId {
    let parent = open.last().copied().unwrap_or_else(|| html.tree.root().id());
    match html.tree.get_mut(parent) {
        Some(mut parent) => parent.append(node).id(),
        None => html.tree.root_mut().append(node).id(),
    }
}

fn element(start: &BytesStart<'_>) -> Result<Element> {
    let name = qualified(&String::from_utf8_lossy(start.name().as_ref()));
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let value = attribute.unescape_value()?;
        attributes.push(Attribute {
            name: qualified(&String::from_utf8_lossy(attribute.key.as_ref())),
            value: StrTendril::from(value.as_ref()),
        });
    }
    Ok(Element::new(name, attributes))
}

fn text_node(text: &str) -> Node {
    Node::Text(Text {
        text: StrTendril::from(text),
    })
}

fn qualified(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}
