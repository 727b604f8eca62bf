//! Per-node output scopes
//!
//! Each visited node gets a [`Scope`] holding the node, a link to the
//! scope of its parent, and the [`Container`] that rules write into.

use serde_json::Value;

use crate::container::{Container, Item};
use crate::dom::Node;

/// Name that only the root scope answers to.
pub const DOCUMENT_NAME: &str = "document";

#[derive(Debug)]
pub struct Scope<'a> {
    node: Node<'a>,
    parent: Option<&'a Scope<'a>>,
    data: Container,
}

impl<'a> Scope<'a> {
    pub fn new(node: Node<'a>, parent: Option<&'a Scope<'a>>) -> Self {
        Self {
            node,
            parent,
            data: Container::new(),
        }
    }

    pub fn node(&self) -> Node<'a> {
        self.node
    }

    pub fn parent(&self) -> Option<&'a Scope<'a>> {
        self.parent
    }

    pub fn data(&self) -> &Container {
        &self.data
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether this scope can be referred to as `name`: by the node's tag
    /// name, by one of its classes, or as `document` when it is the root.
    pub fn has_name(&self, name: &str) -> bool {
        if name == DOCUMENT_NAME {
            return self.is_root();
        }
        self.node.tag_name() == name || self.node.has_class(name)
    }

    /// This scope followed by its ancestors, nearest first.
    pub fn self_and_ancestors(&self) -> impl Iterator<Item = &Scope<'a>> {
        std::iter::successors(Some(self), |scope| scope.parent)
    }

    /// Nearest scope in the chain (starting at this one) called `name`.
    pub fn find_named(&self, name: &str) -> Option<&Scope<'a>> {
        self.self_and_ancestors().find(|scope| scope.has_name(name))
    }

    pub fn to_plain(&self) -> Value {
        self.data.to_plain()
    }
}

impl From<&Scope<'_>> for Item {
    fn from(scope: &Scope<'_>) -> Self {
        Self::Container(scope.data.clone())
    }
}
